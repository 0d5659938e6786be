pub mod cli;
pub mod config;
pub mod dts;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod strings;

fn main() -> anyhow::Result<()> {
    cli::CommandLineInterface::load().run()
}
