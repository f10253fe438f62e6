use crate::project::{Catalog, Error, Project, Source};
use crate::rom::TrackName;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const PROJECT: &str = r#"{
    "track_dir": "music",
    "input_rom": "mm2.nes",
    "output_rom": "out/mm2ft.nes",
    "dpcm_samples": "music/dpcm.bin",
    "exclude_banks": ["$2A", 33, "0x3d"],
    "ft_files": {
        "stages.bin": ["NewFlash", "", "NewHeat"],
        "unused.bin": ["Spare"]
    },
    "c2_files": {
        "Jingle": { "base_addr": "$8D2F", "data": "01 0C 8D FF FF FF FF FF FF 0D 8D 09" },
        "Quiet": {},
        "Leftover": { "base_addr": 32768, "data": "zz" }
    },
    "tracks": {
        "FlashMan": "NewFlash",
        "heatman": "NewHeat",
        "Boss": "Jingle",
        "Title": "WoodMan",
        "Intro": "Quiet",
        "GameOver": null
    }
}"#;

#[test]
fn project_paths() {
    let project = Project::from_json(PROJECT, Path::new("proj")).unwrap();

    assert_eq!(project.track_dir(), Path::new("proj").join("music"));
    assert_eq!(project.input_rom().unwrap(), Path::new("proj").join("mm2.nes"));
    assert_eq!(
        project.output_rom().unwrap(),
        Path::new("proj").join("out").join("mm2ft.nes")
    );
    assert_eq!(
        project.dpcm_samples(),
        Some(Path::new("proj").join("music").join("dpcm.bin"))
    );
}

#[test]
fn project_defaults() {
    let project = Project::from_json(r#"{ "tracks": {} }"#, Path::new("proj")).unwrap();

    assert_eq!(project.track_dir(), Path::new("proj"));
    assert!(matches!(
        project.input_rom(),
        Err(Error::MissingKey("input_rom"))
    ));
    assert!(project.dpcm_samples().is_none());
    assert_eq!(project.free_banks().unwrap(), (0x20..0x3E).collect::<Vec<u8>>());
}

#[test]
fn project_banks() {
    let project = Project::from_json(PROJECT, Path::new(".")).unwrap();
    let free = project.free_banks().unwrap();

    assert_eq!(free.len(), 0x1E - 3);
    assert!(!free.contains(&0x2A));
    assert!(!free.contains(&0x21));
    assert!(!free.contains(&0x3D));
    assert_eq!(free[0], 0x20);

    let project = Project::from_json(
        r#"{ "exclude_banks": ["$1FF"], "tracks": {} }"#,
        Path::new("."),
    )
    .unwrap();

    assert!(matches!(project.free_banks(), Err(Error::InvalidBank(s)) if s == "$1FF"));
}

#[test]
fn project_unknown_slot() {
    let err = Project::from_json(r#"{ "tracks": { "Wily7": null } }"#, Path::new(".")).unwrap_err();

    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn project_duplicate_slot() {
    let err = Project::from_json(
        r#"{ "tracks": { "FlashMan": "Title", "flashman": null } }"#,
        Path::new("."),
    )
    .unwrap_err();

    assert!(matches!(&err, Error::Json(_)));
    assert!(err.to_string().contains("FlashMan is assigned more than once"));
}

#[test]
fn catalog_sources() {
    let project = Project::from_json(PROJECT, Path::new("proj")).unwrap();

    // The bad inline data is only a problem if the track is used.
    let catalog = Catalog::resolve(&project).unwrap();
    let stages = Path::new("proj").join("music").join("stages.bin");

    assert_eq!(
        catalog.source("NewFlash"),
        Some(&Source::Module {
            path: stages.clone(),
            song: 0
        })
    );
    assert_eq!(
        catalog.source("NewHeat"),
        Some(&Source::Module {
            path: stages.clone(),
            song: 2
        })
    );
    assert_eq!(
        catalog.source("Jingle"),
        Some(&Source::Native {
            base_addr: 0x8D2F,
            data: vec![0x01, 0x0C, 0x8D, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x0D, 0x8D, 0x09],
        })
    );
    assert_eq!(
        catalog.source("WoodMan"),
        Some(&Source::Vanilla {
            slot: TrackName::WoodMan
        })
    );
    assert_eq!(catalog.source("Quiet"), Some(&Source::Silent));
    assert_eq!(catalog.source("Spare"), None);
    assert_eq!(catalog.source("Leftover"), None);
    assert_eq!(catalog.source("CrashMan"), None);
    assert_eq!(catalog.module_paths(), vec![&stages]);

    let assignments: Vec<_> = catalog.assignments().collect();

    assert_eq!(assignments.len(), 6);
    assert_eq!(assignments[0].0, TrackName::FlashMan);
    assert_eq!(assignments[0].1.map(|(name, _)| name), Some("NewFlash"));
    assert!(assignments
        .iter()
        .any(|(slot, source)| *slot == TrackName::HeatMan && source.is_some()));
    assert!(assignments
        .iter()
        .any(|(slot, source)| *slot == TrackName::GameOver && source.is_none()));

    let project = Project::from_json(
        &PROJECT.replace(r#""Intro": "Quiet""#, r#""Intro": "Leftover""#),
        Path::new("proj"),
    )
    .unwrap();

    assert!(matches!(
        Catalog::resolve(&project),
        Err(Error::InvalidHexData(name)) if name == "Leftover"
    ));
}

#[test]
fn catalog_unknown_track() {
    let project = Project::from_json(
        r#"{ "tracks": { "Credits": "Missing" } }"#,
        Path::new("."),
    )
    .unwrap();

    assert!(matches!(
        Catalog::resolve(&project),
        Err(Error::UnknownTrack {
            target: TrackName::Credits,
            name
        }) if name == "Missing"
    ));
}

#[test]
fn catalog_duplicate_track() {
    let project = Project::from_json(
        r#"{
            "ft_files": { "a.bin": ["Song"], "b.bin": ["", "Song"] },
            "tracks": {}
        }"#,
        Path::new("."),
    )
    .unwrap();

    assert!(matches!(
        Catalog::resolve(&project),
        Err(Error::DuplicateTrack(name)) if name == "Song"
    ));
}

#[test]
fn catalog_overrides_vanilla_name() {
    let project = Project::from_json(
        r#"{
            "ft_files": { "a.bin": ["Title"] },
            "tracks": { "Title": "Title" }
        }"#,
        Path::new("."),
    )
    .unwrap();

    let catalog = Catalog::resolve(&project).unwrap();

    assert!(matches!(
        catalog.source("Title"),
        Some(Source::Module { song: 0, .. })
    ));
}

#[test]
fn catalog_native_errors() {
    let cases = [
        (r#"{ "data": "09" }"#, "MissingBaseAddr"),
        (r#"{ "base_addr": "nope", "data": "09" }"#, "InvalidAddress"),
        (
            r#"{ "base_addr": "8000", "data": "09", "file": "x.bin" }"#,
            "ConflictingData",
        ),
    ];

    for (native, expected) in cases.iter() {
        let json = format!(
            r#"{{ "c2_files": {{ "T": {} }}, "tracks": {{ "Boss": "T" }} }}"#,
            native
        );
        let project = Project::from_json(&json, Path::new(".")).unwrap();
        let err = Catalog::resolve(&project).unwrap_err();

        let kind = match err {
            Error::MissingBaseAddr(_) => "MissingBaseAddr",
            Error::InvalidAddress { .. } => "InvalidAddress",
            Error::ConflictingData(_) => "ConflictingData",
            _ => "other",
        };

        assert_eq!(kind, *expected);
    }
}

#[test]
fn catalog_native_files() {
    let scratch = tempdir().unwrap();
    let dir = scratch.path();

    fs::write(dir.join("raw.bin"), [0x01u8, 0x02, 0xFE]).unwrap();
    fs::write(dir.join("hex.txt"), "01 02 fe\r\n").unwrap();

    let project = Project::from_json(
        r#"{
            "c2_files": {
                "Raw": { "base_addr": "$9000", "file": "raw.bin" },
                "Hex": { "base_addr": "$9000", "file": "hex.txt" },
                "Gone": { "base_addr": "$9000", "file": "gone.bin" }
            },
            "tracks": { "Boss": "Raw", "Title": "Hex" }
        }"#,
        dir,
    )
    .unwrap();

    let catalog = Catalog::resolve(&project).unwrap();
    let expected = Source::Native {
        base_addr: 0x9000,
        data: vec![0x01, 0x02, 0xFE],
    };

    assert_eq!(catalog.source("Raw"), Some(&expected));
    assert_eq!(catalog.source("Hex"), Some(&expected));

    let project = Project::from_json(
        r#"{
            "c2_files": { "Gone": { "base_addr": "$9000", "file": "gone.bin" } },
            "tracks": { "Boss": "Gone" }
        }"#,
        dir,
    )
    .unwrap();

    assert!(matches!(
        Catalog::resolve(&project),
        Err(Error::Io { path, .. }) if path == dir.join("gone.bin")
    ));
}

#[test]
fn project_read() {
    let scratch = tempdir().unwrap();
    let dir = scratch.path();
    let path = dir.join("ftrom.json");

    fs::write(&path, PROJECT).unwrap();

    let project = Project::read(&path).unwrap();

    assert_eq!(project.root(), dir);
    assert_eq!(project.input_rom().unwrap(), dir.join("mm2.nes"));

    assert!(matches!(
        Project::read(&dir.join("missing.json")),
        Err(Error::Io { .. })
    ));
}
