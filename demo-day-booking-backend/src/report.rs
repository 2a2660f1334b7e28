use demo_day_booking_database::models::{Booking, Room};
use serde::Serialize;

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct BookingRow {
    pub index: usize,
    pub name: String,
    pub phone: String,
    pub startups: String,
    pub room: String,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct Attendee {
    pub index: usize,
    pub name: String,
    pub phone: String,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct StartupTable {
    pub startup: String,
    pub room: String,
    pub attendees: Vec<Attendee>,
}

/// What the admin dashboard shows.
#[derive(Serialize, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub bookings: Vec<BookingRow>,
    pub startups: Vec<StartupTable>,
}

/// Resolves ids to display names. Ids that no longer exist are shown as-is.
#[must_use]
pub fn build_report(rooms: &[Room], bookings: &[Booking]) -> Report {
    let room_name = |room_id: &str| {
        rooms
            .iter()
            .find(|room| room.id == room_id)
            .map_or_else(|| room_id.to_owned(), |room| room.name.clone())
    };
    let startup_name = |startup_id: &str| {
        rooms
            .iter()
            .find_map(|room| room.startup(startup_id))
            .map_or_else(|| startup_id.to_owned(), |startup| startup.name.clone())
    };

    let rows = bookings
        .iter()
        .enumerate()
        .map(|(i, booking)| BookingRow {
            index: i + 1,
            name: booking.name.clone(),
            phone: booking.phone.clone(),
            startups: booking
                .startups
                .iter()
                .map(|id| startup_name(id))
                .collect::<Vec<_>>()
                .join(", "),
            room: room_name(&booking.room_id),
        })
        .collect();

    let tables = rooms
        .iter()
        .flat_map(|room| room.startups.iter().map(move |startup| (room, startup)))
        .filter_map(|(room, startup)| {
            let attendees: Vec<_> = bookings
                .iter()
                .filter(|booking| booking.startups.contains(&startup.id))
                .enumerate()
                .map(|(i, booking)| Attendee {
                    index: i + 1,
                    name: booking.name.clone(),
                    phone: booking.phone.clone(),
                })
                .collect();
            (!attendees.is_empty()).then(|| StartupTable {
                startup: startup.name.clone(),
                room: room.name.clone(),
                attendees,
            })
        })
        .collect();

    Report {
        bookings: rows,
        startups: tables,
    }
}
