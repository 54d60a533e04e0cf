//! Reading classifier weights from safetensors files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use once_cell::sync::OnceCell;
use safetensors::SafeTensors;
use tracing::{debug, info};

/// Weights read on first use and shared by every caller afterwards.
///
/// Candle modules are not `Sync`, so calls go through a mutex and run one at
/// a time. A failed load is not cached; the next call retries.
pub struct LazyModel<T> {
    path: PathBuf,
    device: Device,
    builder: fn(VarBuilder) -> Result<T>,
    model: OnceCell<Mutex<T>>,
}

impl<T: Send> LazyModel<T> {
    /// Prepares a model; nothing is read until [`Self::load`] or [`Self::with`].
    #[must_use]
    pub fn new(path: impl AsRef<Path>, device: Device, builder: fn(VarBuilder) -> Result<T>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            device,
            builder,
            model: OnceCell::new(),
        }
    }

    /// Weights file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the weights now.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the file or building the network fails.
    pub fn load(&self) -> Result<()> {
        self.loaded().map(drop)
    }

    /// Calls `f` on the network, reading the weights first if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the weights cannot be read or `f` fails.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> Result<R>) -> Result<R> {
        let guard = self.loaded()?.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Whether the weights have been read.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    fn loaded(&self) -> Result<&Mutex<T>> {
        self.model.get_or_try_init(|| {
            info!("Loading model from {}", self.path.display());
            let weights = load_safetensors(&self.path, &self.device)?;
            Ok(Mutex::new((self.builder)(weights)?))
        })
    }
}

/// Reads a safetensors weights file into a `VarBuilder` on `device`.
///
/// Half-precision tensors are widened to `f32`. Integer tensors are rejected.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid safetensors, or
/// holds a tensor of an unsupported type.
pub fn load_safetensors(path: impl AsRef<Path>, device: &Device) -> Result<VarBuilder<'static>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read model file: {}", path.display()))?;
    let file = SafeTensors::deserialize(&bytes)
        .with_context(|| format!("Not a safetensors file: {}", path.display()))?;

    let weights = file
        .tensors()
        .into_iter()
        .map(|(name, view)| {
            let dtype = float_dtype(view.dtype())
                .with_context(|| format!("Tensor '{name}' in {}", path.display()))?;
            let tensor = Tensor::from_raw_buffer(view.data(), dtype, view.shape(), device)
                .and_then(|t| t.to_dtype(DType::F32))
                .with_context(|| format!("Failed to create tensor '{name}'"))?;
            Ok((name, tensor))
        })
        .collect::<Result<HashMap<String, Tensor>>>()?;

    debug!(
        "Read {} tensor(s), {} bytes from {}",
        weights.len(),
        bytes.len(),
        path.display()
    );
    Ok(VarBuilder::from_tensors(weights, DType::F32, device))
}

/// Maps a stored float type to the candle type it is read as.
fn float_dtype(dtype: safetensors::Dtype) -> Result<DType> {
    match dtype {
        safetensors::Dtype::F32 => Ok(DType::F32),
        safetensors::Dtype::F64 => Ok(DType::F64),
        safetensors::Dtype::F16 => Ok(DType::F16),
        safetensors::Dtype::BF16 => Ok(DType::BF16),
        other => anyhow::bail!("unsupported weight type {other:?}"),
    }
}
