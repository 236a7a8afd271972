//! Main Transport Stream parser (§4.5): byte-stream resync, per-PID
//! continuity tracking, PAT/PMT/PSIP dispatch, and public queries.
//!
//! Section reassembly is scoped to what fits in a single 188-byte packet —
//! payload-unit-start always marks a complete section beginning at the
//! pointer byte, matching the single-packet-section assumption the
//! reference demuxer made for PAT/PMT.

use std::collections::{HashMap, HashSet};

use crate::errors::TsError;
use crate::logging::SignalLogger;
use crate::ts::packet::{self, PACKET_SIZE, SYNC_BYTE};
use crate::ts::pat::{self, Pat};
use crate::ts::pmt::{self, Pmt, StreamType};
use crate::ts::psip::{self, Eit, Ett, Mgt, Vct};

pub const PID_PAT: u16 = 0x0000;
pub const PID_PSIP_BASE: u16 = 0x1FFB;

#[derive(Debug, Clone, Copy, Default)]
pub struct ParserCounters {
    pub sync_errors: u64,
    pub tei_errors: u64,
    pub continuity_errors: u64,
    pub table_updates: u64,
}

#[derive(Default)]
pub struct TransportStreamParser {
    pat: Option<Pat>,
    pmt_by_program: HashMap<u16, Pmt>,
    pmt_pid_to_program: HashMap<u16, u16>,
    continuity: HashMap<u16, u8>,
    pid_filter: Option<HashSet<u16>>,
    mgt: Option<Mgt>,
    vct: Option<Vct>,
    eit_by_source_id: HashMap<u16, Eit>,
    ett_by_etm_id: HashMap<u32, Ett>,
    counters: ParserCounters,
    logger: SignalLogger,
}

impl TransportStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pid_filter(filter: HashSet<u16>) -> Self {
        Self {
            pid_filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn counters(&self) -> ParserCounters {
        self.counters
    }

    fn pid_allowed(&self, pid: u16) -> bool {
        if pid == PID_PAT || pid == PID_PSIP_BASE {
            return true;
        }
        match &self.pid_filter {
            Some(filter) => filter.contains(&pid),
            None => true,
        }
    }

    /// Updates continuity state for `pid`. Packets with no payload never
    /// advance or validate state. Returns `false` on a continuity mismatch
    /// (the observed value is stored regardless, per §4.5).
    fn update_continuity(&mut self, pid: u16, has_payload: bool, cc: u8) -> bool {
        if !has_payload {
            return true;
        }
        match self.continuity.insert(pid, cc) {
            None => true,
            Some(last) => {
                let expected = (last + 1) % 16;
                if cc == expected {
                    true
                } else {
                    self.counters.continuity_errors += 1;
                    self.logger.warn(
                        "TS",
                        format!("continuity mismatch on PID {pid:#06x}: expected {expected}, got {cc}"),
                    );
                    false
                }
            }
        }
    }

    /// Parses one already-synced 188-byte packet and dispatches it, exactly
    /// as [`Self::parse_stream`] does for each packet it locates. Exposed
    /// directly for tests/scenarios that hand in individual packets.
    pub fn parse_packet(&mut self, data: &[u8]) -> Result<(), TsError> {
        let parsed = packet::parse_packet(data)?;

        if parsed.transport_error_indicator {
            self.counters.tei_errors += 1;
        }

        let continuity_ok = self.update_continuity(parsed.pid, parsed.has_payload, parsed.continuity_counter);

        if parsed.transport_error_indicator || !continuity_ok || !self.pid_allowed(parsed.pid) {
            return Ok(());
        }

        self.dispatch(parsed.pid, parsed.payload_unit_start, parsed.payload);
        Ok(())
    }

    /// Byte-stream parsing loop (§4.5 steps 1-3): advances past bytes that
    /// are not sync bytes (counting sync errors), then parses and
    /// dispatches every complete 188-byte packet found. Returns the number
    /// of packets successfully parsed.
    pub fn parse_stream(&mut self, bytes: &[u8]) -> usize {
        let mut cursor = 0;
        let mut parsed_count = 0;

        while cursor + PACKET_SIZE <= bytes.len() {
            if bytes[cursor] != SYNC_BYTE {
                self.counters.sync_errors += 1;
                self.logger.trace("TS", format!("resyncing at offset {cursor}"));
                cursor += 1;
                continue;
            }

            let packet_bytes = &bytes[cursor..cursor + PACKET_SIZE];
            if self.parse_packet(packet_bytes).is_ok() {
                parsed_count += 1;
            }
            cursor += PACKET_SIZE;
        }

        parsed_count
    }

    fn dispatch(&mut self, pid: u16, payload_unit_start: bool, payload: &[u8]) {
        if !payload_unit_start || payload.is_empty() {
            return;
        }

        let pointer = payload[0] as usize;
        if pointer + 1 > payload.len() {
            return;
        }
        let section = &payload[pointer + 1..];
        if section.is_empty() {
            return;
        }

        if pid == PID_PAT {
            if let Ok(pat) = pat::parse_pat(section) {
                self.pmt_pid_to_program = pat
                    .program_map
                    .iter()
                    .map(|(&program, &pmt_pid)| (pmt_pid, program))
                    .collect();
                self.pat = Some(pat);
                self.counters.table_updates += 1;
            }
            return;
        }

        if pid == PID_PSIP_BASE {
            self.dispatch_psip(section);
            return;
        }

        if let Some(&program_number) = self.pmt_pid_to_program.get(&pid) {
            if let Ok(pmt) = pmt::parse_pmt(section, program_number) {
                self.pmt_by_program.insert(program_number, pmt);
                self.counters.table_updates += 1;
            }
        }
    }

    fn dispatch_psip(&mut self, section: &[u8]) {
        if section.is_empty() {
            return;
        }
        match section[0] {
            psip::TABLE_ID_MGT => {
                if let Ok(mgt) = psip::parse_mgt(section) {
                    self.mgt = Some(mgt);
                    self.counters.table_updates += 1;
                }
            }
            psip::TABLE_ID_TVCT | psip::TABLE_ID_CVCT => {
                if let Ok(vct) = psip::parse_vct(section) {
                    self.vct = Some(vct);
                    self.counters.table_updates += 1;
                }
            }
            psip::TABLE_ID_EIT => {
                if let Ok(eit) = psip::parse_eit(section) {
                    self.eit_by_source_id.insert(eit.source_id, eit);
                    self.counters.table_updates += 1;
                }
            }
            psip::TABLE_ID_ETT => {
                if let Ok(ett) = psip::parse_ett(section) {
                    self.ett_by_etm_id.insert(ett.etm_id, ett);
                    self.counters.table_updates += 1;
                }
            }
            _ => {}
        }
    }

    pub fn get_pat(&self) -> Option<&Pat> {
        self.pat.as_ref()
    }

    pub fn get_pmt(&self, program_number: u16) -> Option<&Pmt> {
        self.pmt_by_program.get(&program_number)
    }

    pub fn get_all_pmts(&self) -> Vec<&Pmt> {
        self.pmt_by_program.values().collect()
    }

    pub fn get_mgt(&self) -> Option<&Mgt> {
        self.mgt.as_ref()
    }

    pub fn get_vct(&self) -> Option<&Vct> {
        self.vct.as_ref()
    }

    pub fn get_eit(&self, source_id: u16) -> Option<&Eit> {
        self.eit_by_source_id.get(&source_id)
    }

    pub fn get_all_eits(&self) -> Vec<&Eit> {
        self.eit_by_source_id.values().collect()
    }

    pub fn get_ett(&self, etm_id: u32) -> Option<&Ett> {
        self.ett_by_etm_id.get(&etm_id)
    }

    /// Maps `stream_type` to the list of elementary PIDs carrying it for
    /// `program_number`.
    pub fn get_elementary_streams(&self, program_number: u16) -> HashMap<StreamType, Vec<u16>> {
        let mut map: HashMap<StreamType, Vec<u16>> = HashMap::new();
        if let Some(pmt) = self.pmt_by_program.get(&program_number) {
            for es in &pmt.elementary_streams {
                map.entry(es.stream_type).or_default().push(es.elementary_pid);
            }
        }
        map
    }

    pub fn get_video_pids(&self, program_number: u16) -> Vec<u16> {
        self.get_elementary_streams(program_number)
            .into_iter()
            .filter(|(stream_type, _)| {
                matches!(stream_type, StreamType::H264Video | StreamType::Mpeg2Video)
            })
            .flat_map(|(_, pids)| pids)
            .collect()
    }

    pub fn get_audio_pids(&self, program_number: u16) -> Vec<u16> {
        self.get_elementary_streams(program_number)
            .into_iter()
            .filter(|(stream_type, _)| matches!(stream_type, StreamType::Aac | StreamType::Ac3))
            .flat_map(|(_, pids)| pids)
            .collect()
    }

    /// Concatenates payload bytes from packets matching `pid`, in arrival
    /// order, excluding TEI-marked packets' payload (§4.5 addition).
    pub fn demultiplex(bytes: &[u8], pid: u16) -> Vec<u8> {
        let mut cursor = 0;
        let mut out = Vec::new();

        while cursor + PACKET_SIZE <= bytes.len() {
            if bytes[cursor] != SYNC_BYTE {
                cursor += 1;
                continue;
            }
            let packet_bytes = &bytes[cursor..cursor + PACKET_SIZE];
            if let Ok(parsed) = packet::parse_packet(packet_bytes) {
                if parsed.pid == pid && parsed.has_payload && !parsed.transport_error_indicator {
                    out.extend_from_slice(parsed.payload);
                }
            }
            cursor += PACKET_SIZE;
        }

        out
    }

    pub fn reset(&mut self) {
        *self = Self {
            pid_filter: self.pid_filter.take(),
            ..Self::default()
        };
    }
}
