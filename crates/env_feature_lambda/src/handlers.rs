pub mod env_features;
