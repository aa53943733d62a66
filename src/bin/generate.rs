//! Dataset synthesis: writes a seeded dense or sparse dataset in the text
//! formats the loaders consume.

use clap::Parser;
use rowsieve::config::Settings;
use rowsieve::data::generate;
use rowsieve::error::Error;
use rowsieve::error::Result;

fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    rowsieve::init();
    let mut settings = Settings::parse();
    settings.seed = Some(settings.seed());
    run(&settings).context("dataset generation failed")
}

fn run(settings: &Settings) -> Result<()> {
    if settings.number_of_rows == 0 || settings.width() == 0 {
        return Err(Error::InputMalformed(
            "generation needs --number-of-rows and --columns".to_string(),
        ));
    }
    let lines = match settings.sparse {
        true => generate::sparse_lines(
            settings.number_of_rows,
            settings.width(),
            settings.sparsity,
            settings.seed(),
        ),
        false => generate::dense_lines(
            settings.number_of_rows,
            settings.width(),
            settings.seed(),
        ),
    };
    log::info!(
        "generated {} lines for {} rows under seed {}",
        lines.len(),
        settings.number_of_rows,
        settings.seed()
    );
    std::fs::write(&settings.output, lines.join("\n") + "\n")?;
    Ok(())
}
