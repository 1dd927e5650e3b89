mod gui;
mod sys;

use clap::Parser;
use dragsquare::{ImagePath, Panel, config};
use gui::app::AppModel;
use relm4::prelude::*;
use std::path::PathBuf;
use sys::runtime;

#[derive(Parser, Debug)]
#[command(name = "dragsquare", version, about, long_about = None)]
struct Cli {
    /// Images offered to empty slots, in order
    images: Vec<PathBuf>,

    /// Write the default config file and print its path
    #[arg(long)]
    write_config: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.write_config {
        let path = config::write_default_config()?;
        println!("{}", path.display());
        return Ok(());
    }

    let config = config::load_or_default();
    let (tx, rx) = async_channel::bounded(32);

    let handle = runtime::start_background_services(tx.clone())?;
    let panel = Panel::from_config(&config, handle, tx);
    let images: Vec<ImagePath> = cli.images.into_iter().map(ImagePath::from).collect();

    // GTK must not see our own arguments
    let app = RelmApp::new("org.stone.dragsquare").with_args(Vec::new());
    app.run::<AppModel>((panel, images, rx));
    Ok(())
}
