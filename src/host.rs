pub(crate) mod pdb;
pub(crate) mod pixels;
pub(crate) mod raster;
