pub mod lobby_id;

pub use lobby_id::LobbyIdPath;
