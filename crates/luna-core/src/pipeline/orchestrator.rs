use tracing::info;

use crate::align::{register_frames, RegistrationParams};
use crate::detection::detect_target_mask;
use crate::error::{LunaError, Result};
use crate::filters::unsharp_mask;
use crate::frame::Image;
use crate::intensity::intensity_map;
use crate::io::{load_frames, save_outputs};
use crate::stack::median_stack;

use super::config::StackerConfig;
use super::types::{NoOpReporter, PipelineStage, ProgressReporter};

/// Run the full stacking pipeline with a thread-safe progress reporter.
///
/// Stages run strictly in order: load, reference mask detection, per-frame
/// registration (parallel), median stack, unsharp mask, output. Returns the
/// final sharpened image after both renditions are written.
pub fn run_pipeline_reported(
    config: &StackerConfig,
    reporter: &dyn ProgressReporter,
) -> Result<Image> {
    reporter.begin_stage(PipelineStage::Reading, None);
    let frames = load_frames(&config.input_dir)?;
    reporter.finish_stage();

    // The middle frame is the reference: it minimizes the worst-case drift
    // to either end of a handheld burst.
    let reference_idx = frames.len() / 2;
    info!(
        total_frames = frames.len(),
        reference = reference_idx,
        warp_mode = ?config.warp_mode,
        "starting registration"
    );

    reporter.begin_stage(PipelineStage::MaskDetection, None);
    let reference_gray = intensity_map(&frames[reference_idx], config.use_clahe);
    let mask = detect_target_mask(&reference_gray);
    reporter.finish_stage();

    let params = RegistrationParams {
        reference: &reference_gray,
        mask: &mask,
        warp_mode: config.warp_mode,
        use_clahe: config.use_clahe,
        resize_for_speed: config.resize_for_speed,
        max_iters: config.ecc_max_iters,
        eps: config.ecc_eps,
    };

    reporter.begin_stage(PipelineStage::Alignment, Some(frames.len()));
    let aligned = register_frames(&frames, reference_idx, &params, |done| {
        reporter.advance(done);
    });
    reporter.finish_stage();

    if aligned.len() < 2 {
        return Err(LunaError::TooFewFrames {
            found: aligned.len(),
        });
    }

    reporter.begin_stage(PipelineStage::Stacking, None);
    let stacked = median_stack(&aligned)?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Sharpening, None);
    let sharpened = unsharp_mask(&stacked, config.unsharp_amount, config.gauss_sigma);
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Writing, None);
    save_outputs(&sharpened, &config.output_dir)?;
    reporter.finish_stage();

    Ok(sharpened)
}

/// Run the full stacking pipeline without progress reporting.
pub fn run_pipeline(config: &StackerConfig) -> Result<Image> {
    run_pipeline_reported(config, &NoOpReporter)
}
