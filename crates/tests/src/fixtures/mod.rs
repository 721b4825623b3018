pub mod chat_client;
pub mod test_app;
