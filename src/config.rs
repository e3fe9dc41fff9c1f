use crate::error::DenoiseError;
use crate::filter::WindowSize;
use crate::ServeArgs;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub default_window_size: WindowSize,
    pub default_seed: u64,
    /// Side length uploads are resized to before `/evaluate`
    pub evaluation_side: u32,
}

impl TryFrom<ServeArgs> for Config {
    type Error = DenoiseError;

    fn try_from(args: ServeArgs) -> Result<Self, Self::Error> {
        if args.evaluation_side == 0 {
            return Err(DenoiseError::InvalidDimensions {
                width: 0,
                height: 0,
            });
        }
        Ok(Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
            default_window_size: WindowSize::new(args.default_window_size)?,
            default_seed: args.default_seed,
            evaluation_side: args.evaluation_side,
        })
    }
}
