//////////////////////////
// server.rs
//////////////////////////
//
// Thin in-memory event relay. Rooms hold an ordered log of opaque JSON
// messages with server-assigned sequence ids; the only game knowledge
// here is strict turn alternation for `move` events. Chess legality is
// entirely the clients' business.

use std::collections::HashMap;
use std::sync::Arc;

use colored::*;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use warp::http::StatusCode;
use warp::Filter;

use crate::net::RoomEvent;
use crate::types::Color;

#[derive(Default)]
struct Players {
    white: Option<String>,
    black: Option<String>,
}

impl Players {
    fn seat_mut(&mut self, color: Color) -> &mut Option<String> {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    fn release(&mut self, sender_id: &str) {
        if self.white.as_deref() == Some(sender_id) {
            self.white = None;
        }
        if self.black.as_deref() == Some(sender_id) {
            self.black = None;
        }
    }
}

struct Room {
    events: Vec<RoomEvent>,
    last_id: u64,
    current_turn: Color,
    players: Players,
}

impl Room {
    fn new() -> Self {
        Room {
            events: Vec::new(),
            last_id: 0,
            current_turn: Color::White,
            players: Players::default(),
        }
    }

    fn add_event(&mut self, message: Value) -> String {
        self.last_id += 1;
        let id = self.last_id.to_string();
        self.events.push(RoomEvent { id: id.clone(), message });
        id
    }
}

/// All rooms behind one lock: one game mutates at a time.
type Rooms = Arc<Mutex<HashMap<String, Room>>>;

#[derive(Debug, Deserialize)]
struct EventsQuery {
    after: Option<String>,
}

fn parse_color(value: Option<&Value>) -> Option<Color> {
    match value.and_then(Value::as_str) {
        Some("white") => Some(Color::White),
        Some("black") => Some(Color::Black),
        _ => None,
    }
}

async fn post_event(
    room_id: String,
    message: Value,
    rooms: Rooms,
) -> Result<impl warp::Reply, warp::Rejection> {
    let Some(fields) = message.as_object() else {
        return Ok(warp::reply::with_status(
            warp::reply::json(&json!({ "error": "Invalid message" })),
            StatusCode::BAD_REQUEST,
        ));
    };
    let kind = fields.get("type").and_then(Value::as_str).map(str::to_owned);
    let sender_id = fields.get("senderId").and_then(Value::as_str).map(str::to_owned);
    let (Some(kind), Some(sender_id)) = (kind, sender_id) else {
        return Ok(warp::reply::with_status(
            warp::reply::json(&json!({ "error": "Missing type or senderId" })),
            StatusCode::BAD_REQUEST,
        ));
    };

    let mut rooms = rooms.lock().await;
    let room = rooms.entry(room_id.clone()).or_insert_with(Room::new);

    match kind.as_str() {
        "presence" => {
            let payload = fields.get("payload");
            let joined = payload
                .and_then(|p| p.get("joined"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let desired = parse_color(payload.and_then(|p| p.get("desiredColor")));
            if joined {
                if let Some(color) = desired {
                    let seat = room.players.seat_mut(color);
                    if seat.is_none() {
                        *seat = Some(sender_id.clone());
                    }
                }
            } else {
                room.players.release(&sender_id);
            }
            let id = room.add_event(message);
            println!(
                "{} room={} id={} sender={} desired={:?}",
                "[presence]".cyan(),
                room_id,
                id,
                sender_id,
                desired
            );
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({ "id": id })),
                StatusCode::CREATED,
            ))
        }
        "move" => {
            let turn = room.current_turn;
            let seat = room.players.seat_mut(turn);
            match seat {
                // first move from an unclaimed seat claims it
                None => *seat = Some(sender_id.clone()),
                Some(expected) if expected != &sender_id => {
                    println!(
                        "{} reject room={} sender={} expectedTurn={} expectedPlayer={}",
                        "[move]".yellow(),
                        room_id,
                        sender_id,
                        turn,
                        expected
                    );
                    return Ok(warp::reply::with_status(
                        warp::reply::json(&json!({ "error": "Not your turn" })),
                        StatusCode::CONFLICT,
                    ));
                }
                Some(_) => {}
            }
            let id = room.add_event(message);
            room.current_turn = turn.opposite();
            println!(
                "{} room={} id={} sender={} nextTurn={}",
                "[move]".green(),
                room_id,
                id,
                sender_id,
                room.current_turn
            );
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({ "id": id })),
                StatusCode::CREATED,
            ))
        }
        other => {
            // unknown types are still recorded
            let id = room.add_event(message);
            println!("{} room={} id={} type={}", "[event]".blue(), room_id, id, other);
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({ "id": id })),
                StatusCode::CREATED,
            ))
        }
    }
}

async fn get_events(
    room_id: String,
    query: EventsQuery,
    rooms: Rooms,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut rooms = rooms.lock().await;
    let room = rooms.entry(room_id).or_insert_with(Room::new);

    let events: Vec<RoomEvent> = match query.after.as_deref().filter(|a| !a.is_empty()) {
        // unknown `after` falls back to the full log so a client that
        // missed a reset can resynchronize
        Some(after) => match room.events.iter().position(|e| e.id == after) {
            Some(idx) => room.events[idx + 1..].to_vec(),
            None => room.events.clone(),
        },
        None => room.events.clone(),
    };
    Ok(warp::reply::json(&json!({ "events": events })))
}

/// The relay's route table, separated out so tests can drive it without a
/// socket.
pub fn routes(
    rooms: Rooms,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({ "ok": true })));

    let with_rooms = warp::any().map(move || rooms.clone());

    let post = warp::path!("rooms" / String / "events")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_rooms.clone())
        .and_then(post_event);

    let get = warp::path!("rooms" / String / "events")
        .and(warp::get())
        .and(warp::query::<EventsQuery>())
        .and(with_rooms)
        .and_then(get_events);

    health.or(post).or(get)
}

pub async fn start_server(port: u16) {
    let rooms: Rooms = Arc::new(Mutex::new(HashMap::new()));
    println!(
        "{} http://0.0.0.0:{}",
        "Chess events relay listening on".green(),
        port
    );
    warp::serve(routes(rooms)).run(([0, 0, 0, 0], port)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::EventsResponse;

    fn test_rooms() -> Rooms {
        Arc::new(Mutex::new(HashMap::new()))
    }

    fn move_body(sender: &str, from: (u8, u8), to: (u8, u8)) -> Value {
        json!({
            "type": "move",
            "roomId": "r1",
            "senderId": sender,
            "payload": { "fromRow": from.0, "fromCol": from.1, "toRow": to.0, "toCol": to.1 }
        })
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let api = routes(test_rooms());
        let res = warp::test::request().method("GET").path("/health").reply(&api).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn events_get_sequence_ids_starting_at_one() {
        let api = routes(test_rooms());
        let res = warp::test::request()
            .method("POST")
            .path("/rooms/r1/events")
            .json(&move_body("alice", (6, 4), (4, 4)))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, json!({ "id": "1" }));

        let res = warp::test::request()
            .method("POST")
            .path("/rooms/r1/events")
            .json(&move_body("bob", (1, 4), (3, 4)))
            .reply(&api)
            .await;
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, json!({ "id": "2" }));
    }

    #[tokio::test]
    async fn out_of_turn_move_conflicts_and_is_not_recorded() {
        let api = routes(test_rooms());
        // alice claims white with the first move
        warp::test::request()
            .method("POST")
            .path("/rooms/r1/events")
            .json(&move_body("alice", (6, 4), (4, 4)))
            .reply(&api)
            .await;
        // alice again, but it is black's turn now
        let res = warp::test::request()
            .method("POST")
            .path("/rooms/r1/events")
            .json(&move_body("alice", (6, 3), (4, 3)))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, json!({ "error": "Not your turn" }));

        let res = warp::test::request()
            .method("GET")
            .path("/rooms/r1/events")
            .reply(&api)
            .await;
        let body: EventsResponse = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body.events.len(), 1);
    }

    #[tokio::test]
    async fn presence_claims_a_color_once() {
        let api = routes(test_rooms());
        let presence = |sender: &str| {
            json!({
                "type": "presence",
                "roomId": "r1",
                "senderId": sender,
                "payload": { "joined": true, "desiredColor": "white" }
            })
        };
        warp::test::request()
            .method("POST")
            .path("/rooms/r1/events")
            .json(&presence("alice"))
            .reply(&api)
            .await;
        warp::test::request()
            .method("POST")
            .path("/rooms/r1/events")
            .json(&presence("bob"))
            .reply(&api)
            .await;
        // white stays alice's: her move is accepted, bob's is not
        let res = warp::test::request()
            .method("POST")
            .path("/rooms/r1/events")
            .json(&move_body("bob", (6, 4), (4, 4)))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res = warp::test::request()
            .method("POST")
            .path("/rooms/r1/events")
            .json(&move_body("alice", (6, 4), (4, 4)))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn polling_with_after_returns_only_newer_events() {
        let api = routes(test_rooms());
        warp::test::request()
            .method("POST")
            .path("/rooms/r1/events")
            .json(&move_body("alice", (6, 4), (4, 4)))
            .reply(&api)
            .await;
        warp::test::request()
            .method("POST")
            .path("/rooms/r1/events")
            .json(&move_body("bob", (1, 4), (3, 4)))
            .reply(&api)
            .await;

        let res = warp::test::request()
            .method("GET")
            .path("/rooms/r1/events?after=1")
            .reply(&api)
            .await;
        let body: EventsResponse = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body.events.len(), 1);
        assert_eq!(body.events[0].id, "2");

        // an id the relay never issued falls back to the full log
        let res = warp::test::request()
            .method("GET")
            .path("/rooms/r1/events?after=99")
            .reply(&api)
            .await;
        let body: EventsResponse = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body.events.len(), 2);
    }

    #[tokio::test]
    async fn missing_type_or_sender_is_a_bad_request() {
        let api = routes(test_rooms());
        let res = warp::test::request()
            .method("POST")
            .path("/rooms/r1/events")
            .json(&json!({ "senderId": "alice" }))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_event_types_are_recorded() {
        let api = routes(test_rooms());
        let res = warp::test::request()
            .method("POST")
            .path("/rooms/r1/events")
            .json(&json!({
                "type": "game_end",
                "roomId": "r1",
                "senderId": "alice",
                "payload": { "winner": "white" }
            }))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = warp::test::request()
            .method("GET")
            .path("/rooms/r1/events")
            .reply(&api)
            .await;
        let body: EventsResponse = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body.events.len(), 1);
        assert_eq!(body.events[0].message["type"], json!("game_end"));
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let api = routes(test_rooms());
        warp::test::request()
            .method("POST")
            .path("/rooms/r1/events")
            .json(&move_body("alice", (6, 4), (4, 4)))
            .reply(&api)
            .await;
        let res = warp::test::request()
            .method("GET")
            .path("/rooms/r2/events")
            .reply(&api)
            .await;
        let body: EventsResponse = serde_json::from_slice(res.body()).unwrap();
        assert!(body.events.is_empty());
    }
}
