mod chat_client;
mod image_client;

pub use chat_client::OpenAiChatClient;
pub use image_client::OpenAiImageClient;
