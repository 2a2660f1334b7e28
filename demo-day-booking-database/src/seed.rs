use crate::models::{RoomRow, Startup, DEFAULT_SPOTS};

pub const DEFAULT_ROOM_ID: &str = "room1";

#[must_use]
pub fn default_rooms() -> Vec<RoomRow> {
    vec![RoomRow {
        id: DEFAULT_ROOM_ID.to_owned(),
        name: "Product Demo Day Startups".to_owned(),
    }]
}

#[must_use]
pub fn default_startups() -> Vec<Startup> {
    [("1", "Tamam"), ("3", "TellSaleem"), ("4", "Soor"), ("5", "Rentat")]
        .into_iter()
        .map(|(id, name)| Startup {
            id: id.to_owned(),
            name: name.to_owned(),
            spots: DEFAULT_SPOTS,
            room_id: DEFAULT_ROOM_ID.to_owned(),
        })
        .collect()
}
