//! Per-frame framebuffer state

use super::Device;
use crate::config::EngineConfig;

/// Owns the frame-level state shared by the sprite and mesh renderers:
/// viewport and clear color
pub struct Renderer {
    device: Device,
    clear_color: [f32; 4],
}

impl Renderer {
    /// Apply the configured viewport and clear color
    pub fn new(device: &Device, config: &EngineConfig) -> Self {
        device.set_viewport(config.window.width, config.window.height);
        device.set_clear_color(config.clear_color);
        log::info!(
            "Renderer initialized: {}x{}",
            config.window.width,
            config.window.height
        );
        Self {
            device: device.clone(),
            clear_color: config.clear_color,
        }
    }

    /// Clear color and depth for a new frame
    pub fn clear(&self) {
        self.device.clear();
    }

    /// Change the clear color
    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
        self.device.set_clear_color(color);
    }

    /// Current clear color
    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Resize the viewport after a window resize
    pub fn resize(&self, width: u32, height: u32) {
        self.device.set_viewport(width, height);
    }

    /// Shared device handle
    pub fn device(&self) -> &Device {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::headless::{DeviceCommand, HeadlessDevice};
    use std::rc::Rc;

    #[test]
    fn test_renderer_applies_config() {
        let headless = Rc::new(HeadlessDevice::new());
        let device: Device = headless.clone();
        let mut renderer = Renderer::new(&device, &EngineConfig::default());
        renderer.set_clear_color([0.0, 0.0, 0.07, 1.0]);
        renderer.clear();

        assert_eq!(
            headless.commands(),
            vec![
                DeviceCommand::SetViewport(800, 600),
                DeviceCommand::SetClearColor([0.25, 0.25, 0.25, 1.0]),
                DeviceCommand::SetClearColor([0.0, 0.0, 0.07, 1.0]),
                DeviceCommand::Clear,
            ]
        );
        assert_eq!(renderer.clear_color(), [0.0, 0.0, 0.07, 1.0]);
    }
}
