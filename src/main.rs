// Example runner for the `palette_vision` library.
//
// Usage: palette_vision [IMAGE]
//
// With an image path, the image is fed to the service as a 30 fps "video"; without
// one, a solid teal source stands in for a camera. Settings come from the
// PALETTE_VISION_* environment variables.

use futures::StreamExt;
use palette_vision::config::read_config;
use palette_vision::logger::init_logger;
use palette_vision::parallel_pipeline::{repeating_source, solid_color_source};
use palette_vision::{Frame, PaletteService, RgbColor};
use std::path::PathBuf;
use tracing::info;

const SOURCE_FPS: u32 = 30;
const PALETTES_TO_PRINT: usize = 5;

#[tokio::main]
async fn main() -> palette_vision::Result<()> {
    let config = read_config()?;
    init_logger(config.logger.clone())?;

    println!("Palette Vision Engine - Example Runner");
    info!(algorithm = %config.algorithm, colors = config.number_of_colors, "Loaded configuration");

    let service = PaletteService::from_config(&config)?;
    let palettes = service.palette_stream().take(PALETTES_TO_PRINT);

    let source = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => {
            let frame = Frame::load(&path)?;
            info!(
                path = %path.display(),
                width = frame.width,
                height = frame.height,
                "Loaded image"
            );
            repeating_source(frame, SOURCE_FPS).boxed()
        }
        None => solid_color_source(RgbColor::new(0.1, 0.6, 0.6), 640, 480, SOURCE_FPS).boxed(),
    };

    let printer = tokio::spawn(async move {
        let mut palettes = std::pin::pin!(palettes);
        let mut index = 0;
        while let Some(palette) = palettes.next().await {
            index += 1;
            let swatches: Vec<String> = palette.iter().map(RgbColor::to_hex).collect();
            println!("palette {index}: {}", swatches.join(" "));
        }
    });

    // Enough frames to outlast the throttle for every printed palette.
    let frames_per_palette =
        config.throttle_interval.as_millis() as usize * SOURCE_FPS as usize / 1000 + 1;
    let frames_needed = PALETTES_TO_PRINT * frames_per_palette + 1;
    service.drive(source.take(frames_needed)).await?;
    service.shutdown().await?;
    printer.await.map_err(|e| palette_vision::PaletteError::Worker {
        message: e.to_string(),
    })?;

    Ok(())
}
