//! Inference device choice.

use candle_core::Device;
use tracing::info;

/// Picks the device the classifier runs on.
///
/// GPU backends are tried only when compiled in. A backend that fails to
/// open falls back to the CPU.
#[must_use]
pub fn get_device() -> Device {
    let device = accelerator().unwrap_or(Device::Cpu);
    info!("Classifier runs on {}", describe(&device));
    device
}

#[allow(clippy::unnecessary_wraps)]
fn accelerator() -> Option<Device> {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => return Some(device),
            Err(e) => tracing::debug!("Metal unavailable: {e}"),
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => return Some(device),
            Err(e) => tracing::debug!("CUDA unavailable: {e}"),
        }
    }

    None
}

fn describe(device: &Device) -> &'static str {
    if device.is_metal() {
        "Metal"
    } else if device.is_cuda() {
        "CUDA"
    } else {
        "CPU"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_names() {
        assert_eq!(describe(&Device::Cpu), "CPU");
    }

    #[cfg(not(any(feature = "metal", feature = "cuda")))]
    #[test]
    fn test_cpu_without_gpu_features() {
        assert!(get_device().is_cpu());
    }
}
