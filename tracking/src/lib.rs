extern crate adskalman;
extern crate nalgebra as na;
extern crate num_traits;

pub mod landmark_motion_model;
pub mod landmark_observation_model;
