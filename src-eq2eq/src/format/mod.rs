//! eq2eq - encoders from filter records to preset documents
//!
//! Copyright (C) 2025 Pierre Aubert pierre(at)spinorama(dot)org
//!
//! This program is free software: you can redistribute it and/or modify
//! it under the terms of the GNU General Public License as published by
//! the Free Software Foundation, either version 3 of the License, or
//! (at your option) any later version.
//!
//! This program is distributed in the hope that it will be useful,
//! but WITHOUT ANY WARRANTY; without even the implied warranty of
//! MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//! GNU General Public License for more details.
//!
//! You should have received a copy of the GNU General Public License
//! along with this program.  If not, see <https://www.gnu.org/licenses/>.

pub mod apo;
pub mod aupreset;
pub mod rme;

pub use apo::records_to_apo;
pub use aupreset::{AUPRESET_BANDS, records_to_aupreset};
pub use rme::{RME_CHANNEL_BANDS, RME_ROOM_BANDS, records_to_rme_channel, records_to_rme_room};
