use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use super::*;
use crate::doc::{Cell, CellId, Endpoint, Point, Size};

fn sample_document() -> Document {
    let order = Cell::element("uml.Class", Point::new(20.0, 40.0), Size::new(240.0, 140.0))
        .with_extra("name", json!("Order"))
        .with_extra("attributes", json!(["id: Uuid", "total: Money"]))
        .with_extra("methods", json!(["submit()", "cancel()"]));
    let line = Cell::element("uml.Class", Point::new(400.0, 40.0), Size::new(200.0, 100.0))
        .with_extra("name", json!("OrderLine"));
    let mut composition = Cell::link("uml.Composition", Endpoint::cell(order.id), Endpoint::cell(line.id))
        .with_attr(".connection", json!({"stroke": "#1F1A17", "stroke-width": 2}));
    composition.vertices = vec![Point::new(300.0, 90.0)];
    Document::new(vec![order, line, composition])
}

fn encode_raw_json(json: &[u8]) -> String {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(json).unwrap();
    URL_SAFE_NO_PAD.encode(encoder.finish().unwrap())
}

#[test]
fn round_trip_preserves_document() {
    let doc = sample_document();
    let encoded = encode(&doc);
    let decoded = decode(encoded.as_str()).expect("decode should succeed");
    assert_eq!(decoded, doc);
}

const EXTREMES: [f64; 8] = [
    f64::MAX,
    f64::MIN,
    f64::MIN_POSITIVE,
    f64::EPSILON,
    5e-324,
    -1.0e-300,
    0.1 + 0.2,
    -0.0,
];

fn coordinate(rng: &mut StdRng) -> f64 {
    if rng.random_bool(0.2) {
        EXTREMES[rng.random_range(0..EXTREMES.len())]
    } else {
        rng.random::<f64>() * 2000.0 - 1000.0
    }
}

fn point(rng: &mut StdRng) -> Point {
    Point::new(coordinate(rng), coordinate(rng))
}

fn nested_value(rng: &mut StdRng, depth: u32) -> Value {
    let arms = if depth == 0 { 4 } else { 6 };
    match rng.random_range(0..arms) {
        0 => json!(coordinate(rng)),
        1 => json!(rng.random::<i64>()),
        2 => json!(format!("label-{}", rng.random::<u16>())),
        3 => json!(rng.random_bool(0.5)),
        4 => Value::Array((0..3).map(|_| nested_value(rng, depth - 1)).collect()),
        _ => json!({ "a": nested_value(rng, depth - 1), "b": { "c": nested_value(rng, depth - 1) } }),
    }
}

fn generated_document(rng: &mut StdRng) -> Document {
    let mut cells: Vec<Cell> = Vec::new();
    for i in 0..rng.random_range(1..8) {
        let size = Size::new(rng.random::<f64>() * 300.0, rng.random::<f64>() * 300.0);
        let mut cell = Cell::element("uml.Class", point(rng), size)
            .with_extra("name", json!(format!("C{i}")))
            .with_extra("meta", nested_value(rng, 3))
            .with_attr(".uml-class-name-rect", nested_value(rng, 3));
        cell.angle = coordinate(rng);
        cell.z = rng.random();
        cells.push(cell);
    }
    for _ in 0..rng.random_range(0..6) {
        let pick = |rng: &mut StdRng, cells: &[Cell]| -> Endpoint {
            if rng.random_bool(0.3) {
                Endpoint::Point(point(rng))
            } else {
                let id = cells[rng.random_range(0..cells.len())].id;
                if rng.random_bool(0.5) {
                    Endpoint::cell(id)
                } else {
                    Endpoint::Cell { id, port: Some("out".into()) }
                }
            }
        };
        let source = pick(rng, &cells);
        let target = pick(rng, &cells);
        let mut link = Cell::link("uml.Association", source, target)
            .with_attr(".connection", json!({ "stroke-width": coordinate(rng) }));
        link.vertices = (0..rng.random_range(0..4)).map(|_| point(rng)).collect();
        cells.push(link);
    }
    Document::new(cells)
}

#[test]
fn generated_documents_round_trip_exactly() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..300 {
        let doc = generated_document(&mut rng);
        doc.validate().expect("generated document is valid");
        let decoded = decode(encode(&doc).as_str()).expect("decode should succeed");
        assert_eq!(decoded, doc);
    }
}

#[test]
fn fractional_coordinates_survive_bit_for_bit() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..2000 {
        let p = Point::new(rng.random::<f64>() * 1000.0, rng.random::<f64>() * 1000.0);
        let doc = Document::new(vec![Cell::element("uml.State", p, Size::new(10.0, 10.0))]);
        let back = decode(encode(&doc).as_str()).unwrap();
        let q = back.cells[0].position.unwrap();
        assert_eq!((q.x.to_bits(), q.y.to_bits()), (p.x.to_bits(), p.y.to_bits()));
    }
}

#[test]
fn round_trip_of_empty_document() {
    let encoded = encode(&Document::EMPTY);
    assert!(!encoded.as_str().is_empty());
    assert_eq!(decode(encoded.as_str()).unwrap(), Document::EMPTY);
}

#[test]
fn encoding_is_url_and_clipboard_safe() {
    let encoded = encode(&sample_document());
    assert!(
        encoded
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    );
}

#[test]
fn encoding_is_deterministic() {
    let doc = sample_document();
    assert_eq!(encode(&doc), encode(&doc));
}

#[test]
fn compression_shrinks_repetitive_documents() {
    let cells = (0..50)
        .map(|i| {
            Cell::element("uml.Class", Point::new(f64::from(i), 0.0), Size::new(100.0, 60.0))
                .with_extra("name", json!("Repeated"))
        })
        .collect();
    let doc = Document::new(cells);
    let raw = serde_json::to_string(&doc).unwrap();
    assert!(encode(&doc).as_str().len() < raw.len());
}

#[test]
fn decode_ignores_surrounding_whitespace() {
    let doc = sample_document();
    let padded = format!("  {}\n", encode(&doc));
    assert_eq!(decode(&padded).unwrap(), doc);
}

#[test]
fn decode_rejects_empty_input() {
    assert!(matches!(decode(""), Err(CodecError::Empty)));
    assert!(matches!(decode(" \n\t"), Err(CodecError::Empty)));
}

#[test]
fn decode_rejects_non_base64() {
    assert!(matches!(decode("not a diagram!"), Err(CodecError::Base64(_))));
}

#[test]
fn decode_rejects_non_deflate_payload() {
    let garbage = URL_SAFE_NO_PAD.encode([0xffu8, 0xff, 0xff, 0xff, 0x00, 0x12]);
    assert!(matches!(decode(&garbage), Err(CodecError::Inflate(_))));
}

#[test]
fn decode_rejects_non_json_payload() {
    let encoded = encode_raw_json(b"definitely not json");
    assert!(matches!(decode(&encoded), Err(CodecError::Json(_))));
}

#[test]
fn decode_rejects_structurally_invalid_graph() {
    let ghost = CellId::random();
    let a = Cell::element("uml.Class", Point::default(), Size::new(10.0, 10.0));
    let link = Cell::link("uml.Association", Endpoint::cell(a.id), Endpoint::cell(ghost));
    let json = serde_json::to_vec(&Document::new(vec![a, link])).unwrap();
    let err = decode(&encode_raw_json(&json)).unwrap_err();
    assert!(matches!(err, CodecError::Invalid(DocumentError::DanglingEndpoint { .. })));
}

#[test]
fn decode_rejects_oversized_payload() {
    let padding = " ".repeat(usize::try_from(MAX_DECODED_BYTES).unwrap() + 16);
    let json = format!("{{\"cells\":[]{padding}}}");
    let err = decode(&encode_raw_json(json.as_bytes())).unwrap_err();
    assert!(matches!(err, CodecError::TooLarge));
}

#[test]
fn parse_json_validates() {
    let doc = sample_document();
    let json = to_json_pretty(&doc).unwrap();
    assert_eq!(parse_json(&json).unwrap(), doc);
    assert!(matches!(parse_json("[1, 2]"), Err(CodecError::Json(_))));
}

#[test]
fn encoded_diagram_serializes_as_plain_string() {
    let encoded = EncodedDiagram::from("abc".to_owned());
    assert_eq!(serde_json::to_string(&encoded).unwrap(), "\"abc\"");
    assert_eq!(encoded.to_string(), "abc");
    assert_eq!(encoded.into_inner(), "abc");
}
