//! Live packet-metadata intake. Packets arrive as pre-parsed metadata rows
//! (CSV from a capture tool or another process); the tracker folds them into
//! per-flow state and emits a canonical feature vector per packet, which
//! then goes through the same classification path as file records. An
//! earlier revision of this surface streamed fabricated verdicts; every
//! observation now gets a real one.

use crate::pipeline::PredictionResult;
use crate::schema::{self, FeatureVector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// One observed packet, as parsed upstream of this process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketMeta {
    pub src: String,
    pub dst: String,
    pub protocol: String,
    pub length: u64,
    /// Raw TCP flag bits when the packet is TCP
    pub tcp_flags: Option<u8>,
    /// Well-known service name when the port maps to one
    pub service: Option<String>,
}

/// A classified live observation.
#[derive(Debug, Clone, Serialize)]
pub struct LiveEvent {
    /// 1-based packet counter within this capture
    pub packet: u64,
    pub result: PredictionResult,
    pub features: FeatureVector,
}

struct FlowState {
    started: Instant,
    src_bytes: u64,
    dst_bytes: u64,
}

/// Folds packets into bidirectional flow state keyed by endpoints and
/// protocol. A packet travelling against an existing flow's direction
/// credits that flow's destination bytes.
#[derive(Default)]
pub struct FlowTracker {
    flows: HashMap<(String, String, String), FlowState>,
    packets: u64,
}

impl FlowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packet_count(&self) -> u64 {
        self.packets
    }

    /// Account one packet and return its feature vector.
    pub fn observe(&mut self, packet: &PacketMeta) -> FeatureVector {
        self.packets += 1;
        let proto = packet.protocol.trim().to_ascii_lowercase();
        let reverse = (packet.dst.clone(), packet.src.clone(), proto.clone());

        // A packet travelling against a known flow belongs to that flow
        let src_to_dst = !self.flows.contains_key(&reverse);
        let key = if src_to_dst {
            (packet.src.clone(), packet.dst.clone(), proto)
        } else {
            reverse
        };

        let state = self.flows.entry(key).or_insert_with(|| FlowState {
            started: Instant::now(),
            src_bytes: 0,
            dst_bytes: 0,
        });
        if src_to_dst {
            state.src_bytes += packet.length;
        } else {
            state.dst_bytes += packet.length;
        }
        let duration = round4(state.started.elapsed().as_secs_f32());
        let src_bytes = state.src_bytes;
        let dst_bytes = state.dst_bytes;

        let mut vector = FeatureVector::zeroed();
        vector.set("duration", duration);
        vector.set("protocol_type", schema::protocol_code(&packet.protocol));
        vector.set(
            "service",
            packet
                .service
                .as_deref()
                .map(schema::service_code)
                .unwrap_or(0.0),
        );
        vector.set("flag", schema::flag_code(flag_name(packet.tcp_flags)));
        vector.set("src_bytes", src_bytes as f32);
        vector.set("dst_bytes", dst_bytes as f32);
        vector.set("land", if packet.src == packet.dst { 1.0 } else { 0.0 });
        vector
    }
}

/// Coarse connection-status flag from raw TCP bits. Non-TCP packets and
/// plain data packets read as a finished exchange.
fn flag_name(tcp_flags: Option<u8>) -> &'static str {
    const FIN: u8 = 0x01;
    const SYN: u8 = 0x02;
    const RST: u8 = 0x04;
    const ACK: u8 = 0x10;

    match tcp_flags {
        Some(bits) if bits & RST != 0 => "REJ",
        Some(bits) if bits & SYN != 0 && bits & ACK == 0 => "S0",
        Some(bits) if bits & FIN != 0 => "SF",
        _ => "SF",
    }
}

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}
