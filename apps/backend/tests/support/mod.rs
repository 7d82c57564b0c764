#![allow(dead_code)]

pub mod websocket_client;
