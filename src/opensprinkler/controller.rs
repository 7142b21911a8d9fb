//! Station bits and the apply engine
//!
//! Callers set the commanded bits, then [OpenSprinkler::apply_all_station_bits] issues the hardware actions needed to
//! bring every station to its commanded state and records what was applied.

use super::{
    errors::ActuationError,
    hal::ActuationBackend,
    station::{self, SpecialStation, Station, StationIndex},
    OpenSprinkler,
};

impl OpenSprinkler {
    /// Set station bit
    ///
    /// This function sets the corresponding station bit. [OpenSprinkler::apply_all_station_bits] must be called after
    /// to apply the bits (which results in physically actuating the valves). Returns [true] if the bit changed.
    pub fn set_station_bit(&mut self, station_index: StationIndex, value: bool) -> bool {
        if station_index >= self.get_station_count() {
            tracing::warn!("Station {} out of range", station_index);
            return false;
        }

        self.state.station.set_active(station_index, value)
    }

    /// Apply all station bits
    ///
    /// **This will actuate valves**
    pub fn apply_all_station_bits(&mut self) {
        self.apply_station_bits(false);
    }

    /// Clear all station bits and switch every station off, whatever its applied state
    pub fn clear_all_station_bits(&mut self) {
        self.state.station.clear();
        self.apply_station_bits(true);
    }

    /// Stations in ascending order, masters last. With `force` every station is actuated, changed or not.
    fn apply_station_bits(&mut self, force: bool) {
        self.state.status.enabled = self.config.enable_controller;
        let station_count = self.get_station_count();

        for station_index in 0..station_count {
            // Master stations are handled separately
            if self.is_master_station(station_index) {
                continue;
            }
            self.apply_station(station_index, force);
        }

        for master_index in self.master_station_indices(station_count) {
            let value = (0..station::MAX_MASTER_STATIONS)
                .filter(|&master| self.get_master_station_index(master) == Some(master_index))
                .any(|master| self.master_station_demand(master, station_count));
            self.state.station.set_active(master_index, value);
            self.apply_station(master_index, force);
        }

        if let ActuationBackend::DirectDrive(_) = self.backend {
            let frame = self.direct_drive_frame(station_count);
            let board_count = self.get_board_count();

            if let ActuationBackend::DirectDrive(ref mut shift_register) = self.backend {
                shift_register.write(&frame[..board_count]);
            }
        }
    }

    /// Distinct master stations in range, in master order
    ///
    /// Both master slots may name the same station; it is then applied once with the combined demand.
    fn master_station_indices(&self, station_count: usize) -> Vec<StationIndex> {
        let mut indices = Vec::with_capacity(station::MAX_MASTER_STATIONS);
        for master in 0..station::MAX_MASTER_STATIONS {
            if let Some(master_index) = self.get_master_station_index(master) {
                if master_index < station_count && !indices.contains(&master_index) {
                    indices.push(master_index);
                }
            }
        }
        indices
    }

    /// A station is driven on only if it is commanded on and the controller is enabled
    ///
    /// While disabled the commanded bits are kept but every station is applied OFF, so the applied bits stay clear.
    fn effective_state(&self, station_index: StationIndex) -> bool {
        self.config.enable_controller && self.state.station.is_active(station_index)
    }

    /// Master `master` is needed if any non-master station using it is on
    fn master_station_demand(&self, master: usize, station_count: usize) -> bool {
        (0..station_count).any(|station_index| {
            !self.is_master_station(station_index)
                && self.config.stations.get(station_index).map_or(false, |station| station.attrib.use_master[master])
                && self.effective_state(station_index)
        })
    }

    fn apply_station(&mut self, station_index: StationIndex, force: bool) {
        let target = self.effective_state(station_index);
        let unchanged = !force && self.state.station.is_applied(station_index) == target;

        let special = self.config.stations.get(station_index).filter(|station| station.is_special()).map(Station::special);

        let result = match special {
            Some(special) => {
                if unchanged {
                    return;
                }
                special.and_then(|special: SpecialStation| self.dispatcher.switch_special_station(station_index, &special, target))
            }
            None => match self.backend {
                // Written as one frame once every station is applied
                ActuationBackend::DirectDrive(_) => Ok(()),
                ActuationBackend::LatchingRelay(ref mut driver) => {
                    if unchanged {
                        return;
                    }
                    driver.set_station(station_index, target)
                }
            },
        };

        self.commit_station(station_index, target, result);
    }

    /// Record the outcome of one transition
    ///
    /// Network failures still count as applied since remote state cannot be confirmed. Any other failure leaves the
    /// station pending so the next apply retries it.
    fn commit_station(&mut self, station_index: StationIndex, value: bool, result: Result<(), ActuationError>) {
        match result {
            Ok(()) => {
                if self.state.status.fault_station == Some(station_index) {
                    tracing::info!("[Latch] Station {} recovered from overcurrent fault", station_index);
                    self.state.status.overcurrent_fault = false;
                    self.state.status.fault_station = None;
                }
                self.state.station.set_applied(station_index, value);
            }
            Err(ref error) if error.is_network() => {
                self.state.station.set_applied(station_index, value);
            }
            Err(ActuationError::OvercurrentFault { reading, threshold, .. }) => {
                tracing::error!("[Latch] Station {} overcurrent ({} > {}), transition aborted", station_index, reading, threshold);
                self.state.status.overcurrent_fault = true;
                self.state.status.fault_station = Some(station_index);
            }
            Err(ref error) => {
                tracing::warn!("Station {} not actuated: {}", station_index, error);
            }
        }
    }

    /// Applied bits of the standard stations, one byte per board
    fn direct_drive_frame(&self, station_count: usize) -> [u8; station::MAX_NUM_BOARDS] {
        let mut frame = [0u8; station::MAX_NUM_BOARDS];

        for station_index in 0..station_count {
            if !self.is_special_station(station_index) && self.state.station.is_applied(station_index) {
                frame[station_index >> 3] |= 1 << (station_index & 0x07);
            }
        }

        frame
    }

    /// Handle refresh of special stations
    ///
    /// Re-sends the applied state of the next special station in line, no more than once per second. The round robin
    /// starts mid-range to avoid startup delays.
    pub fn check_special_station_auto_refresh(&mut self, now_seconds: i64) {
        if !self.config.enable_special_stn_refresh || now_seconds <= self.state.station.auto_refresh_timestamp {
            return;
        }
        self.state.station.auto_refresh_timestamp = now_seconds;

        let station_count = self.get_station_count();
        let mut next = self.state.station.auto_refresh_next_index;

        for _ in 0..station::MAX_NUM_STATIONS {
            next = (next + 1) % station::MAX_NUM_STATIONS;

            if next < station_count && self.is_special_station(next) {
                self.state.station.auto_refresh_next_index = next;
                self.refresh_special_station(next);
                return;
            }
        }
    }

    fn refresh_special_station(&mut self, station_index: StationIndex) {
        let value = self.state.station.is_applied(station_index);
        tracing::trace!("Refresh special station {} ({})", station_index, value);

        let result = self.config.stations[station_index]
            .special()
            .and_then(|special| self.dispatcher.switch_special_station(station_index, &special, value));

        if let Err(ref error) = result {
            tracing::debug!("Refresh of station {} failed: {}", station_index, error);
        }
    }
}
