mod generate_image;
mod health;
mod job_status;
mod transcribe;
mod video;

pub use generate_image::generate_image_handler;
pub use health::health_handler;
pub use job_status::job_status_handler;
pub use transcribe::transcribe_handler;
pub use video::{burn_subtitles_handler, image_to_video_handler};
