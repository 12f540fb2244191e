/// SW3D - render an OBJ mesh to a TGA image
///
/// Example:
///   sw3d head.obj -t head_diffuse.tga -o head.tga --preview

use clap::Parser;
use sw3d_cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    run(&cli)
}
