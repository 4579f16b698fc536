use anyhow::Result;
use clap::Parser;
use dotmatrix::{Args, RunOptions};

fn main() -> Result<()> {
    env_logger::init();

    let options = RunOptions::from(Args::parse());
    let rom = options.rom.clone();
    let summary = dotmatrix::run(options)?;

    log::info!("{}: ran {} frames", rom.display(), summary.frames);
    if !summary.serial.is_empty() {
        println!("{}", String::from_utf8_lossy(&summary.serial));
    }
    Ok(())
}
