//! Noise-density sweep comparing restoration filters

use crate::error::DenoiseError;
use crate::filter::WindowSize;
use crate::filters::FilterRegistry;
use crate::metrics::Quality;
use crate::noise::{salt_and_pepper, NoiseMask};
use image::GrayImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Densities swept when none are requested
pub const DEFAULT_DENSITIES: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];
/// Densities written out as sample images when none are requested
pub const DEFAULT_SAMPLE_DENSITIES: [f64; 2] = [0.3, 0.7];
pub const DEFAULT_SEED: u64 = 42;

/// Parameters of one evaluation run
#[derive(Debug, Clone)]
pub struct EvaluationSettings {
    pub densities: Vec<f64>,
    pub window: WindowSize,
    pub seed: u64,
    /// Filter names to compare; empty means every registered filter
    pub methods: Vec<String>,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            densities: DEFAULT_DENSITIES.to_vec(),
            window: WindowSize::DEFAULT,
            seed: DEFAULT_SEED,
            methods: Vec::new(),
        }
    }
}

/// Score of one filter at one density
#[derive(Debug, Clone, Serialize)]
pub struct MethodScore {
    pub method: String,
    #[serde(flatten)]
    pub quality: Quality,
    pub time_ms: u64,
}

/// Results for one noise density
#[derive(Debug, Clone, Serialize)]
pub struct DensityReport {
    pub density: f64,
    /// Share of pixels actually at 0 or 255 after injection
    pub corrupted_fraction: f64,
    /// The noisy image measured against the original
    pub noisy: Quality,
    pub scores: Vec<MethodScore>,
}

impl DensityReport {
    /// Method with the highest PSNR, first one wins ties
    pub fn best(&self) -> Option<&MethodScore> {
        self.scores.iter().fold(None, |best: Option<&MethodScore>, s| match best {
            Some(b) if b.quality.psnr >= s.quality.psnr => Some(b),
            _ => Some(s),
        })
    }
}

/// Full sweep result
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub width: u32,
    pub height: u32,
    pub window_size: WindowSize,
    pub seed: u64,
    pub densities: Vec<DensityReport>,
}

impl EvaluationReport {
    /// Fixed-width results table, one block per density
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let rule = "-".repeat(50);

        let _ = writeln!(
            out,
            "{:<10} | {:<10} | {:<10} | {:<10}",
            "Density", "Method", "PSNR (dB)", "MSE"
        );
        let _ = writeln!(out, "{}", rule);

        for row in &self.densities {
            let best = row.best().map(|s| s.method.as_str());
            for (i, score) in row.scores.iter().enumerate() {
                let density = if i == 0 {
                    format!("{:.0}%", row.density * 100.0)
                } else {
                    String::new()
                };
                let marker = if Some(score.method.as_str()) == best { " *" } else { "" };
                let _ = writeln!(
                    out,
                    "{:<10} | {:<10} | {:<10.2} | {:<10.2}{}",
                    density, score.method, score.quality.psnr, score.quality.mse, marker
                );
            }
            let _ = writeln!(out, "{}", rule);
        }

        out
    }
}

/// Resolve the requested method names against the registry
fn resolve_methods<'a>(
    registry: &'a FilterRegistry,
    settings: &'a EvaluationSettings,
) -> Result<Vec<&'a str>, DenoiseError> {
    if settings.methods.is_empty() {
        return Ok(registry.list());
    }
    settings
        .methods
        .iter()
        .map(|name| registry.require(name).map(|_| name.as_str()))
        .collect()
}

fn validate_densities(densities: &[f64]) -> Result<(), DenoiseError> {
    match densities
        .iter()
        .find(|d| !d.is_finite() || !(0.0..=1.0).contains(*d))
    {
        Some(&bad) => Err(DenoiseError::InvalidDensity(bad)),
        None => Ok(()),
    }
}

/// Run the density sweep on a clean reference image
pub fn evaluate(
    original: &GrayImage,
    registry: &FilterRegistry,
    settings: &EvaluationSettings,
) -> Result<EvaluationReport, DenoiseError> {
    let (width, height) = original.dimensions();
    if width == 0 || height == 0 {
        return Err(DenoiseError::InvalidDimensions { width, height });
    }
    validate_densities(&settings.densities)?;
    let methods = resolve_methods(registry, settings)?;

    tracing::info!(
        "Evaluating {} filters on {}x{} image, window {}, seed {}",
        methods.len(),
        width,
        height,
        settings.window,
        settings.seed
    );

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut densities = Vec::with_capacity(settings.densities.len());

    for &density in &settings.densities {
        let noisy = salt_and_pepper(original, density, &mut rng)?;
        let corrupted_fraction = NoiseMask::detect(&noisy).fraction();

        let mut scores = Vec::with_capacity(methods.len());
        for &name in &methods {
            let filter = registry.require(name)?;
            let start = Instant::now();
            let restored = filter.apply(&noisy, settings.window)?;
            let time_ms = start.elapsed().as_millis() as u64;

            scores.push(MethodScore {
                method: name.to_string(),
                quality: Quality::measure(original, &restored)?,
                time_ms,
            });
        }

        let report = DensityReport {
            density,
            corrupted_fraction,
            noisy: Quality::measure(original, &noisy)?,
            scores,
        };

        if let Some(best) = report.best() {
            tracing::debug!(
                "Density {:.2}: best method {} ({:.2} dB)",
                density,
                best.method,
                best.quality.psnr
            );
        }
        densities.push(report);
    }

    Ok(EvaluationReport {
        width,
        height,
        window_size: settings.window,
        seed: settings.seed,
        densities,
    })
}

/// Write the noisy input and every method's output for each sample density.
///
/// Files are named `density_<percent>_<kind>.png`, the percentage kept to
/// one decimal place. Densities that share a label are rejected before
/// anything is written. Noise is drawn from its own seeded generator, so
/// samples do not perturb the sweep.
pub fn write_samples(
    original: &GrayImage,
    registry: &FilterRegistry,
    settings: &EvaluationSettings,
    sample_densities: &[f64],
    output_dir: &Path,
) -> Result<Vec<PathBuf>, DenoiseError> {
    validate_densities(sample_densities)?;
    let methods = resolve_methods(registry, settings)?;

    let mut labels = HashSet::new();
    for &density in sample_densities {
        let label = density_label(density);
        if !labels.insert(label.clone()) {
            return Err(DenoiseError::InvalidRequest(format!(
                "Sample density {} collides with another density at label {}%",
                density, label
            )));
        }
    }

    std::fs::create_dir_all(output_dir).map_err(|e| {
        DenoiseError::Internal(format!(
            "Failed to create output directory {}: {}",
            output_dir.display(),
            e
        ))
    })?;

    let mut rng = StdRng::seed_from_u64(settings.seed.wrapping_add(1));
    let mut written = Vec::new();

    for &density in sample_densities {
        let noisy = salt_and_pepper(original, density, &mut rng)?;
        let prefix = format!("density_{}", density_label(density));

        let path = output_dir.join(format!("{}_noisy.png", prefix));
        save_png(&noisy, &path)?;
        written.push(path);

        for &name in &methods {
            let restored = registry.require(name)?.apply(&noisy, settings.window)?;
            let path = output_dir.join(format!("{}_{}.png", prefix, name));
            save_png(&restored, &path)?;
            written.push(path);
        }
    }

    tracing::info!(
        "Wrote {} sample images to {}",
        written.len(),
        output_dir.display()
    );

    Ok(written)
}

/// Density as a percentage with at most one decimal: 0.3 -> "30", 0.301 -> "30.1"
fn density_label(density: f64) -> String {
    let tenths = (density * 1000.0).round() as u32;
    if tenths % 10 == 0 {
        format!("{}", tenths / 10)
    } else {
        format!("{}.{}", tenths / 10, tenths % 10)
    }
}

fn save_png(image: &GrayImage, path: &Path) -> Result<(), DenoiseError> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| DenoiseError::ImageEncode(format!("{}: {}", path.display(), e)))
}
