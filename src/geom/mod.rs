mod proj;

pub use proj::Reprojector;
