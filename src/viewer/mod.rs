//! Interactive chart window: eframe app, wgpu backend and egui labels.

mod app;
mod background;
mod labels;
mod renderer;
mod viewport;

pub use background::load_background;
pub use labels::EguiLabels;
pub use renderer::WgpuBackend;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::prelude::*;

use crate::settings::Settings;

/// Environment switch for writing `trace.json`.
const TRACE_ENV: &str = "MAPBARS_TRACE";

/// Open the chart window, loading `initial_file` (or the last file) first.
pub fn run(initial_file: Option<PathBuf>) -> Result<()> {
    env_logger::init();
    let chrome_guard = chrome_trace_layer();
    report_panics();

    let settings = Settings::load();
    let options = native_options(&settings);

    eframe::run_native(
        "mapbars",
        options,
        Box::new(move |cc| Ok(Box::new(app::MapbarsApp::new(cc, initial_file.clone(), chrome_guard)))),
    )
    .map_err(|e| anyhow::anyhow!("mapbars window closed with an error: {}", e))
}

/// Print panics as one readable block; wgpu validation failures name the pass that broke.
fn report_panics() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info.payload();
        let msg = payload
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| payload.downcast_ref::<&str>().copied())
            .unwrap_or("panic without message");

        let kind = if msg.contains("wgpu") || msg.contains("Validation") {
            "render"
        } else {
            "viewer"
        };
        eprintln!("\nmapbars {} failure: {}", kind, msg);
        if let Some(loc) = info.location() {
            eprintln!("  at {}:{}", loc.file(), loc.line());
        }
    }));
}

/// Window size from the settings; the device may allocate textures as
/// large as the adapter allows, so deep shadow targets only downgrade on
/// real limits.
fn native_options(settings: &Settings) -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window_width, settings.window_height])
            .with_min_inner_size([320.0, 240.0])
            .with_title("mapbars"),
        renderer: eframe::Renderer::Wgpu,
        wgpu_options: egui_wgpu::WgpuConfiguration {
            wgpu_setup: egui_wgpu::WgpuSetup::CreateNew(egui_wgpu::WgpuSetupCreateNew {
                device_descriptor: Arc::new(|adapter| {
                    let defaults = match adapter.get_info().backend {
                        wgpu::Backend::Gl => wgpu::Limits::downlevel_webgl2_defaults(),
                        _ => wgpu::Limits::default(),
                    };
                    wgpu::DeviceDescriptor {
                        label: Some("mapbars device"),
                        required_limits: wgpu::Limits {
                            max_texture_dimension_2d: adapter.limits().max_texture_dimension_2d,
                            ..defaults
                        },
                        ..Default::default()
                    }
                }),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Chrome trace output, enabled with `MAPBARS_TRACE=1`.
fn chrome_trace_layer() -> Option<tracing_chrome::FlushGuard> {
    if std::env::var(TRACE_ENV).ok().as_deref() != Some("1") {
        return None;
    }
    let (layer, guard) = tracing_chrome::ChromeLayerBuilder::new().file("trace.json").build();
    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(layer))
        .ok()
        .map(|_| guard)
}
