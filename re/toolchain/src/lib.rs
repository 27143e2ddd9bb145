mod toolchain;

pub use toolchain::Toolchain;
