use std::io;

fn main() -> io::Result<()> {
    ftrom::cli::main()
}
