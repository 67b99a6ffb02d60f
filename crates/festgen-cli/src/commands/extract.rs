use festgen_core::config::{self, ConversionConfig, HwpStrategy};
use festgen_core::error::FestgenError;
use festgen_core::{ensure_pdftotext_for, extract_file_text, extractors_with};
use std::path::PathBuf;

/// Text extraction only; needs no generation credentials.
pub fn run(input_file: PathBuf, hwp_strategy: Option<HwpStrategy>) -> Result<(), FestgenError> {
    config::load_dotenv()?;
    let strategy = match hwp_strategy {
        Some(strategy) => strategy,
        None => config::env_lookup("FESTGEN_HWP_STRATEGY")
            .map(|raw| raw.parse::<HwpStrategy>())
            .transpose()?
            .unwrap_or_default(),
    };
    ensure_pdftotext_for(&input_file, strategy)?;
    let conversion = match strategy {
        HwpStrategy::Remote => Some(ConversionConfig::from_lookup(config::env_lookup)?),
        HwpStrategy::Offline => None,
    };

    let extractors = extractors_with(strategy, conversion.as_ref())?;
    let text = extract_file_text(&input_file, &extractors)?;
    println!("{text}");
    Ok(())
}
