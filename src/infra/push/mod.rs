pub mod web_push_transport;
