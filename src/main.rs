use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = campus_theme::cli::Cli::parse();
    campus_theme::run(cli)?;
    Ok(())
}
