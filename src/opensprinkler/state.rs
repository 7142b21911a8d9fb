use super::station::{self, StationIndex};

/// Board index and bit mask of a station
fn locate(station_index: StationIndex) -> (usize, u8) {
    (station_index >> 3, 1 << (station_index & 0x07))
}

/// Station on/off bits, one byte per board
///
/// `active` holds the commanded state, `applied` the state most recently issued to the hardware.
pub struct StationState {
    active: [u8; station::MAX_NUM_BOARDS],
    applied: [u8; station::MAX_NUM_BOARDS],
    /// Special station auto-refresh next station index
    pub auto_refresh_next_index: StationIndex,
    /// Most recent timestamp of special station auto-refresh
    pub auto_refresh_timestamp: i64,
}

impl StationState {
    /// Set all station active flags to [false]
    pub fn clear(&mut self) {
        self.active = [0; station::MAX_NUM_BOARDS];
    }

    pub fn is_active(&self, station_index: StationIndex) -> bool {
        let (board, mask) = locate(station_index);
        self.active.get(board).map_or(false, |bits| bits & mask != 0)
    }

    /// Returns [true] if the bit changed
    pub fn set_active(&mut self, station_index: StationIndex, active: bool) -> bool {
        let (board, mask) = locate(station_index);

        match self.active.get_mut(board) {
            Some(bits) => {
                let previous = *bits;
                if active {
                    *bits |= mask;
                } else {
                    *bits &= !mask;
                }
                previous != *bits
            }
            None => false,
        }
    }

    pub fn is_applied(&self, station_index: StationIndex) -> bool {
        let (board, mask) = locate(station_index);
        self.applied.get(board).map_or(false, |bits| bits & mask != 0)
    }

    pub fn set_applied(&mut self, station_index: StationIndex, applied: bool) {
        let (board, mask) = locate(station_index);

        if let Some(bits) = self.applied.get_mut(board) {
            if applied {
                *bits |= mask;
            } else {
                *bits &= !mask;
            }
        }
    }

    /// Commanded bits of one board
    pub fn board(&self, board_index: usize) -> u8 {
        self.active[board_index]
    }

    /// Applied bits of one board
    pub fn applied_board(&self, board_index: usize) -> u8 {
        self.applied[board_index]
    }
}

impl Default for StationState {
    fn default() -> Self {
        Self {
            active: [0; station::MAX_NUM_BOARDS],
            applied: [0; station::MAX_NUM_BOARDS],
            // Start mid-range so a restart does not hammer the first special stations
            auto_refresh_next_index: station::MAX_NUM_STATIONS >> 1,
            auto_refresh_timestamp: 0,
        }
    }
}

/// Controller status, rebuilt at every start
#[derive(Debug, Default)]
pub struct ControllerStatus {
    /// Controller is enabled
    pub enabled: bool,
    /// Rain delay is active
    pub rain_delayed: bool,
    /// Rain sensor is active
    pub rain_sensed: bool,
    /// A program is currently being executed
    pub program_busy: bool,
    /// Latch board can measure the boost current
    pub has_curr_sense: bool,
    /// Master station index
    pub mas: Option<StationIndex>,
    /// Master #2 station index
    pub mas2: Option<StationIndex>,
    /// A latch transition tripped the current limit
    pub overcurrent_fault: bool,
    /// Station whose transition tripped the current limit
    pub fault_station: Option<StationIndex>,
}

/// Rain Delay state
#[derive(Debug, Default)]
pub struct RainDelayState {
    /// time when the most recent rain delay started (seconds)
    pub timestamp_active_last: Option<i64>,
    pub active_previous: bool,
}

/// State for recording/logging realtime flow count
#[derive(Debug, Default)]
pub struct FlowState {
    /// Flow count at the start of the current log run
    pub count_log_start: u64,
    /// Pulses counted during the last complete realtime window
    pub count_realtime_now: u64,
    /// Flow count at the start of the current realtime window
    pub count_realtime_start: u64,
}

#[derive(Default)]
pub struct ControllerState {
    pub station: StationState,
    pub status: ControllerStatus,
    pub rain_delay: RainDelayState,
    pub flow: FlowState,
}
