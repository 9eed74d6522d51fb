//! Volume binding tokens: `NAME:PATH[:MODE]`.

use crate::error::DkrError;
use std::str::FromStr;

pub const DEFAULT_MODE: &str = "rw";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VolumeBinding {
    pub volume_name: String,
    pub guest_mount_point: String,
    pub mode: String,
}

impl VolumeBinding {
    /// Engine bind spec, e.g. `data:/var/lib/data:ro`.
    pub fn bind_spec(&self) -> String {
        format!(
            "{}:{}:{}",
            self.volume_name, self.guest_mount_point, self.mode
        )
    }
}

impl FromStr for VolumeBinding {
    type Err = DkrError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = token.split(':').collect();
        let (name, path, mode) = match segments.as_slice() {
            [name, path, mode] => (*name, *path, *mode),
            [name, path] => (*name, *path, DEFAULT_MODE),
            _ => {
                return Err(DkrError::invalid_input(
                    "Volume parameter must have 2 or 3 parts: NAME:PATH[:MODE]",
                ))
            }
        };

        Ok(VolumeBinding {
            volume_name: name.to_string(),
            guest_mount_point: path.to_string(),
            mode: mode.to_string(),
        })
    }
}
