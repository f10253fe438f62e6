use crate::memory::{write_u16, Window};

#[test]
fn window_decode() {
    let data = [0u8; 0x20];
    let window = Window::new(&data, 0xA000);

    assert_eq!(window.decode_addr(0xA000), Some(0));
    assert_eq!(window.decode_addr(0xA01F), Some(0x1F));
    assert_eq!(window.decode_addr(0x9FFF), None);
}

#[test]
fn window_check_addr() {
    let data = [0u8; 0x10];
    let window = Window::new(&data, 0x8000);

    assert!(window.check_addr(0x8000, 1, false));
    assert!(window.check_addr(0x800E, 2, false));
    assert!(!window.check_addr(0x800F, 2, false));
    assert!(!window.check_addr(0x7FFF, 1, false));
    assert!(!window.check_addr(0, 1, false));
    assert!(window.check_addr(0, 1, true));
}

#[test]
fn window_words() {
    let mut data = vec![0u8; 6];

    write_u16(&mut data, 0, 0x1234);
    write_u16(&mut data, 2, 0xBEEF);

    let window = Window::new(&data, 0);

    assert_eq!(data[0], 0x34);
    assert_eq!(data[1], 0x12);
    assert_eq!(window.read_u16(2), Some(0xBEEF));
    assert_eq!(window.read_u16(5), None);
    assert_eq!(window.read_u16_array(0, 3), Some(vec![0x1234, 0xBEEF, 0]));
    assert_eq!(window.read_u16_array(2, 3), None);
}
