//! Well connection with its three ordering domains
//!
//! A connection is created in one of three ways: from COMPDAT input, attached
//! to a segment by COMPSEGS, or rebuilt from a restart record. The
//! `sort_value` ties the three orders together:
//!
//! * Ordinary wells: simulation order follows COMPORD while restart order
//!   equals input order, so `sort_value` is the insertion index.
//! * Segmented wells: the segment order is the simulation order and is kept
//!   for the restart file, so `sort_value` is the COMPSEGS insertion index.
//!
//! After a restart the persisted order is already the simulation order and
//! `sort_value` is the restart index; nothing is recomputed.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::checksum::bitwise_eq;
use crate::error::{LookupError, ValueError};
use crate::grid::CellLookup;

/// Flow state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum State {
    Open,
    #[default]
    Shut,
    Auto,
}

crate::persist_enum!(State {
    Open = 1,
    Shut = 2,
    Auto = 3,
});

impl FromStr for State {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "SHUT" | "STOP" => Ok(Self::Shut),
            "AUTO" => Ok(Self::Auto),
            other => Err(ValueError::new("Connection::State", other)),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "OPEN",
            Self::Shut => "SHUT",
            Self::Auto => "AUTO",
        })
    }
}

/// Penetration direction of the well bore through the cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    X,
    Y,
    #[default]
    Z,
}

crate::persist_enum!(Direction {
    X = 1,
    Y = 2,
    Z = 3,
});

impl FromStr for Direction {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" | "x" => Ok(Self::X),
            "Y" | "y" => Ok(Self::Y),
            "Z" | "z" => Ok(Self::Z),
            other => Err(ValueError::new("completion direction", other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        })
    }
}

/// Simulation ordering of the connections of an ordinary well
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Order {
    Depth,
    Input,
    #[default]
    Track,
}

crate::persist_enum!(Order {
    Depth = 1,
    Input = 2,
    Track = 3,
});

impl FromStr for Order {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPTH" => Ok(Self::Depth),
            "INPUT" => Ok(Self::Input),
            "TRACK" => Ok(Self::Track),
            other => Err(ValueError::new("Connection::Order", other)),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Depth => "DEPTH",
            Self::Input => "INPUT",
            Self::Track => "TRACK",
        })
    }
}

/// Where the transmissibility factor came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CtfKind {
    #[default]
    DeckValue,
    Defaulted,
}

crate::persist_enum!(CtfKind {
    DeckValue = 1,
    Defaulted = 2,
});

impl fmt::Display for CtfKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DeckValue => "DeckValue",
            Self::Defaulted => "Defaulted",
        })
    }
}

/// Pressure dependent injectivity multiplier
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InjMult {
    pub is_active: bool,
    pub fracture_pressure: f64,
    pub multiplier_gradient: f64,
}

crate::persist_fields!(InjMult {
    is_active,
    fracture_pressure,
    multiplier_gradient,
});

impl fmt::Display for InjMult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "active {} fracture pressure {} multiplier gradient {}",
            self.is_active, self.fracture_pressure, self.multiplier_gradient
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterCakeGeometry {
    Linear,
    Radial,
    #[default]
    None,
}

crate::persist_enum!(FilterCakeGeometry {
    Linear = 1,
    Radial = 2,
    None = 3,
});

/// Filter cake deposited around the well bore
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterCake {
    pub geometry: FilterCakeGeometry,
    pub perm: f64,
    pub poro: f64,
    pub radius: Option<f64>,
    pub flow_area: Option<f64>,
    pub sf_multiplier: f64,
}

crate::persist_fields!(FilterCake {
    geometry,
    perm,
    poro,
    radius,
    flow_area,
    sf_multiplier,
});

impl fmt::Display for FilterCake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "geometry {:?} perm {} poro {}", self.geometry, self.perm, self.poro)?;
        if let Some(radius) = self.radius {
            write!(f, " radius {}", radius)?;
        }
        if let Some(area) = self.flow_area {
            write!(f, " flow area {}", area)?;
        }
        write!(f, " sf multiplier {}", self.sf_multiplier)
    }
}

/// Transmissibility parameters of a connection
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CtfProperties {
    pub CF: f64,
    pub Kh: f64,
    pub rw: f64,
    pub r0: f64,
    pub re: f64,
    pub connection_length: f64,
    pub skin_factor: f64,
    pub d_factor: f64,
    pub Ke: f64,
}

crate::persist_fields!(CtfProperties {
    CF,
    Kh,
    rw,
    r0,
    re,
    connection_length,
    skin_factor,
    d_factor,
    Ke,
});

impl CtfProperties {
    /// Peaceman factor `2 pi Kh / (ln(r0 / rw) + skin)`
    pub fn peaceman_cf(&self) -> f64 {
        2.0 * PI * self.Kh / ((self.r0 / self.rw).ln() + self.skin_factor)
    }
}

/// Equivalent pressure radius of an anisotropic cell for a given direction
pub fn peaceman_r0(direction: Direction, size: [f64; 3], perm: [f64; 3]) -> f64 {
    let (d1, d2, k1, k2) = match direction {
        Direction::X => (size[1], size[2], perm[1], perm[2]),
        Direction::Y => (size[0], size[2], perm[0], perm[2]),
        Direction::Z => (size[0], size[1], perm[0], perm[1]),
    };
    let ratio = k2 / k1;
    0.28 * ((ratio.sqrt() * d1 * d1) + (1.0 / ratio).sqrt() * d2 * d2).sqrt()
        / (ratio.powf(0.25) + (1.0 / ratio).powf(0.25))
}

/// Connection as stored in a restart file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RstConnection {
    pub ijk: [usize; 3],
    pub state: State,
    pub dir: Direction,
    pub drain_sat_table: i32,
    pub completion: i32,
    pub cf: f64,
    pub kh: f64,
    pub diameter: f64,
    pub r0: f64,
    pub skin_factor: f64,
    pub cf_kind: CtfKind,
    pub rst_index: usize,
    pub segment: i32,
    pub depth: f64,
    pub segdist_start: f64,
    pub segdist_end: f64,
}

/// A perforation of a well through one grid cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    direction: Direction,
    center_depth: f64,
    open_state: State,
    sat_table_id: i32,
    complnum: i32,
    ctf: CtfProperties,
    i: usize,
    j: usize,
    k: usize,
    ctf_kind: CtfKind,
    injmult: Option<InjMult>,
    global_index: usize,
    sort_value: usize,
    perf_range: Option<(f64, f64)>,
    default_sat_table: bool,
    // 0 means not attached to a segment
    segment_number: i32,
    subject_to_welpi: bool,
    wpimult: f64,
    filter_cake: Option<FilterCake>,
}

crate::persist_fields!(Connection {
    direction,
    center_depth,
    open_state,
    sat_table_id,
    complnum,
    ctf,
    i,
    j,
    k,
    ctf_kind,
    injmult,
    global_index,
    sort_value,
    perf_range,
    default_sat_table,
    segment_number,
    subject_to_welpi,
    wpimult,
    filter_cake,
});

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        bitwise_eq(self, other)
    }
}

impl Connection {
    /// Create a new connection from input data
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ijk: [usize; 3],
        global_index: usize,
        complnum: i32,
        depth: f64,
        state: State,
        ctf: CtfProperties,
        sat_table_id: i32,
        direction: Direction,
        ctf_kind: CtfKind,
        sort_value: usize,
        default_sat_table: bool,
    ) -> Self {
        Self {
            direction,
            center_depth: depth,
            open_state: state,
            sat_table_id,
            complnum,
            ctf,
            i: ijk[0],
            j: ijk[1],
            k: ijk[2],
            ctf_kind,
            injmult: None,
            global_index,
            sort_value,
            perf_range: None,
            default_sat_table,
            segment_number: 0,
            subject_to_welpi: false,
            wpimult: 1.0,
            filter_cake: None,
        }
    }

    /// Rebuild a connection from its restart record
    ///
    /// The restart index becomes the sort value; the saturation table is
    /// always taken from the grid.
    pub fn reconstruct_from_restart(
        rst: &RstConnection,
        grid: &dyn CellLookup,
    ) -> Result<Self, LookupError> {
        let [i, j, k] = rst.ijk;
        let global_index = grid.global_index(i, j, k)?;
        let sat_table_id = grid.satnum(grid.active_index(i, j, k)?)?;

        let perf_range = if rst.segment > 0 {
            Some((rst.segdist_start, rst.segdist_end))
        } else {
            None
        };

        Ok(Self {
            direction: rst.dir,
            center_depth: rst.depth,
            open_state: rst.state,
            sat_table_id,
            complnum: rst.completion,
            ctf: CtfProperties {
                CF: rst.cf,
                Kh: rst.kh,
                rw: rst.diameter / 2.0,
                r0: rst.r0,
                re: 0.0,
                connection_length: 0.0,
                skin_factor: rst.skin_factor,
                d_factor: 0.0,
                Ke: 0.0,
            },
            i,
            j,
            k,
            ctf_kind: rst.cf_kind,
            injmult: None,
            global_index,
            sort_value: rst.rst_index,
            perf_range,
            default_sat_table: true,
            segment_number: rst.segment,
            subject_to_welpi: false,
            wpimult: 1.0,
            filter_cake: None,
        })
    }

    /// Restart record for this connection at position `rst_index`
    pub fn to_restart(&self, rst_index: usize) -> RstConnection {
        let (segdist_start, segdist_end) = self.perf_range.unwrap_or((0.0, 0.0));
        RstConnection {
            ijk: self.ijk(),
            state: self.open_state,
            dir: self.direction,
            drain_sat_table: self.sat_table_id,
            completion: self.complnum,
            cf: self.ctf.CF,
            kh: self.ctf.Kh,
            diameter: 2.0 * self.ctf.rw,
            r0: self.ctf.r0,
            skin_factor: self.ctf.skin_factor,
            cf_kind: self.ctf_kind,
            rst_index,
            segment: self.segment_number,
            depth: self.center_depth,
            segdist_start,
            segdist_end,
        }
    }

    /// Attach the connection to a segment, taking the COMPSEGS order
    pub fn attach_to_segment(
        &mut self,
        segment: i32,
        depth: f64,
        insertion_index: usize,
        perf_range: (f64, f64),
    ) {
        self.segment_number = segment;
        self.center_depth = depth;
        self.sort_value = insertion_index;
        self.perf_range = Some(perf_range);
    }

    /// Segment update from restart data, keeping the sort value
    pub fn update_segment_rst(&mut self, segment: i32, depth: f64) {
        self.segment_number = segment;
        self.center_depth = depth;
    }

    pub fn same_coordinate(&self, i: usize, j: usize, k: usize) -> bool {
        self.i == i && self.j == j && self.k == k
    }

    pub fn ijk(&self) -> [usize; 3] {
        [self.i, self.j, self.k]
    }

    pub fn i(&self) -> usize {
        self.i
    }

    pub fn j(&self) -> usize {
        self.j
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn global_index(&self) -> usize {
        self.global_index
    }

    pub fn attached_to_segment(&self) -> bool {
        self.segment_number > 0
    }

    pub fn segment(&self) -> i32 {
        self.segment_number
    }

    pub fn sort_value(&self) -> usize {
        self.sort_value
    }

    pub(crate) fn set_sort_value(&mut self, sort_value: usize) {
        self.sort_value = sort_value;
    }

    pub fn perf_range(&self) -> Option<(f64, f64)> {
        self.perf_range
    }

    pub fn dir(&self) -> Direction {
        self.direction
    }

    pub fn depth(&self) -> f64 {
        self.center_depth
    }

    pub fn state(&self) -> State {
        self.open_state
    }

    pub fn set_state(&mut self, state: State) {
        self.open_state = state;
    }

    pub fn sat_table_id(&self) -> i32 {
        self.sat_table_id
    }

    pub fn default_sat_table(&self) -> bool {
        self.default_sat_table
    }

    pub fn complnum(&self) -> i32 {
        self.complnum
    }

    pub fn set_complnum(&mut self, complnum: i32) {
        self.complnum = complnum;
    }

    pub fn ctf(&self) -> &CtfProperties {
        &self.ctf
    }

    #[allow(non_snake_case)]
    pub fn CF(&self) -> f64 {
        self.ctf.CF
    }

    #[allow(non_snake_case)]
    pub fn set_CF(&mut self, cf: f64) {
        self.ctf.CF = cf;
    }

    pub fn set_skin_factor(&mut self, skin_factor: f64) {
        self.ctf.skin_factor = skin_factor;
    }

    pub fn set_d_factor(&mut self, d_factor: f64) {
        self.ctf.d_factor = d_factor;
    }

    pub fn wpimult(&self) -> f64 {
        self.wpimult
    }

    pub fn kind(&self) -> CtfKind {
        self.ctf_kind
    }

    pub fn ctf_assigned_from_input(&self) -> bool {
        self.ctf_kind == CtfKind::DeckValue
    }

    pub fn subject_to_welpi(&self) -> bool {
        self.subject_to_welpi
    }

    /// Multiply the transmissibility factor by a productivity index factor
    pub fn scale_well_pi(&mut self, well_pi: f64) {
        self.wpimult *= well_pi;
        self.ctf.CF *= well_pi;
    }

    /// Mark the connection as subject to WELPI scaling
    ///
    /// Returns whether the flag was newly set.
    pub fn prepare_well_pi_scaling(&mut self) -> bool {
        let update = !self.subject_to_welpi;
        self.subject_to_welpi = true;
        update
    }

    /// Scale the connection if it is subject to WELPI scaling
    pub fn apply_well_pi_scaling(&mut self, scale_factor: f64) -> bool {
        if !self.subject_to_welpi {
            return false;
        }
        self.scale_well_pi(scale_factor);
        true
    }

    pub fn injmult(&self) -> Option<&InjMult> {
        self.injmult.as_ref()
    }

    pub fn set_injmult(&mut self, injmult: InjMult) {
        self.injmult = Some(injmult);
    }

    pub fn filter_cake(&self) -> Option<&FilterCake> {
        self.filter_cake.as_ref()
    }

    pub fn set_filter_cake(&mut self, filter_cake: FilterCake) {
        self.filter_cake = Some(filter_cake);
    }

    /// Filter cake radius, the well bore radius unless given
    pub fn filter_cake_radius(&self) -> Option<f64> {
        self.filter_cake
            .as_ref()
            .map(|cake| cake.radius.unwrap_or(self.ctf.rw))
    }

    /// Filter cake flow area, the perforated cylinder surface unless given
    pub fn filter_cake_area(&self) -> Option<f64> {
        let cake = self.filter_cake.as_ref()?;
        Some(match cake.flow_area {
            Some(area) => area,
            None => {
                let radius = cake.radius.unwrap_or(self.ctf.rw);
                2.0 * PI * radius * self.ctf.connection_length
            }
        })
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ijk: {},{},{}", self.i, self.j, self.k)?;
        writeln!(f, "COMPLNUM {}", self.complnum)?;
        writeln!(f, "CF {}", self.ctf.CF)?;
        writeln!(f, "RW {}", self.ctf.rw)?;
        writeln!(f, "R0 {}", self.ctf.r0)?;
        writeln!(f, "Re {}", self.ctf.re)?;
        writeln!(f, "connection length {}", self.ctf.connection_length)?;
        writeln!(f, "skinf {}", self.ctf.skin_factor)?;
        writeln!(f, "dfactor {}", self.ctf.d_factor)?;
        writeln!(f, "Ke {}", self.ctf.Ke)?;
        writeln!(f, "kh {}", self.ctf.Kh)?;
        writeln!(f, "sat_tableId {}", self.sat_table_id)?;
        writeln!(f, "open_state {}", self.open_state)?;
        writeln!(f, "direction {}", self.direction)?;
        writeln!(f, "CTF Source {}", self.ctf_kind)?;
        writeln!(f, "segment_nr {}", self.segment_number)?;
        writeln!(f, "center_depth {}", self.center_depth)?;
        writeln!(f, "sort_value {}", self.sort_value)?;
        if let Some(injmult) = &self.injmult {
            writeln!(f, "INJMULT {}", injmult)?;
        }
        if let Some(cake) = &self.filter_cake {
            writeln!(f, "FilterCake {}", cake)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::checksum_octets;
    use crate::grid::CartesianGrid;
    use crate::serialization::{pack, unpack};

    fn ctf() -> CtfProperties {
        CtfProperties {
            CF: 4.0,
            Kh: 5.0,
            rw: 0.1,
            r0: 7.0,
            re: 7.1,
            connection_length: 7.2,
            skin_factor: 0.0,
            d_factor: 8.5,
            Ke: 8.9,
        }
    }

    fn connection(sort_value: usize) -> Connection {
        Connection::new(
            [1, 2, 3],
            321,
            3,
            1.0,
            State::Open,
            ctf(),
            2,
            Direction::Y,
            CtfKind::DeckValue,
            sort_value,
            false,
        )
    }

    #[test]
    fn test_state_strings() {
        assert_eq!("STOP".parse::<State>().unwrap(), State::Shut);
        assert_eq!("AUTO".parse::<State>().unwrap(), State::Auto);
        assert_eq!(State::Open.to_string(), "OPEN");
        assert!("open".parse::<State>().is_err());
    }

    #[test]
    fn test_direction_accepts_lower_case() {
        assert_eq!("x".parse::<Direction>().unwrap(), Direction::X);
        assert_eq!("Z".parse::<Direction>().unwrap(), Direction::Z);
        assert!("W".parse::<Direction>().is_err());
    }

    #[test]
    fn test_order_strings() {
        assert_eq!("TRACK".parse::<Order>().unwrap(), Order::Track);
        assert_eq!(Order::Depth.to_string(), "DEPTH");
        let err = "SIDEWAYS".parse::<Order>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown Connection::Order string: SIDEWAYS");
    }

    #[test]
    fn test_attach_to_segment_takes_insertion_index() {
        let mut conn = connection(4);
        assert!(!conn.attached_to_segment());

        conn.attach_to_segment(2, 1500.0, 0, (10.0, 20.0));
        assert!(conn.attached_to_segment());
        assert_eq!(conn.sort_value(), 0);
        assert_eq!(conn.depth(), 1500.0);
        assert_eq!(conn.perf_range(), Some((10.0, 20.0)));

        conn.update_segment_rst(3, 1600.0);
        assert_eq!(conn.segment(), 3);
        assert_eq!(conn.sort_value(), 0);
    }

    #[test]
    fn test_restart_reconstruction() {
        let grid = CartesianGrid::new(5, 5, 5).with_satnum(vec![7; 125]);
        let rst = RstConnection {
            ijk: [1, 2, 3],
            state: State::Open,
            dir: Direction::Z,
            drain_sat_table: 1,
            completion: 2,
            cf: 10.0,
            kh: 100.0,
            diameter: 0.5,
            r0: 2.0,
            skin_factor: 0.5,
            cf_kind: CtfKind::Defaulted,
            rst_index: 6,
            segment: 0,
            depth: 2000.0,
            segdist_start: 1.0,
            segdist_end: 2.0,
        };

        let conn = Connection::reconstruct_from_restart(&rst, &grid).unwrap();
        assert_eq!(conn.sort_value(), 6);
        assert_eq!(conn.ctf().rw, 0.25);
        assert_eq!(conn.sat_table_id(), 7);
        assert_eq!(conn.global_index(), 1 + 2 * 5 + 3 * 25);
        assert_eq!(conn.perf_range(), None);

        let segmented = RstConnection { segment: 2, ..rst };
        let conn = Connection::reconstruct_from_restart(&segmented, &grid).unwrap();
        assert_eq!(conn.perf_range(), Some((1.0, 2.0)));
    }

    #[test]
    fn test_well_pi_scaling() {
        let mut conn = connection(0);
        assert!(!conn.apply_well_pi_scaling(2.0));
        assert_eq!(conn.CF(), 4.0);

        assert!(conn.prepare_well_pi_scaling());
        assert!(!conn.prepare_well_pi_scaling());
        assert!(conn.apply_well_pi_scaling(2.0));
        assert_eq!(conn.CF(), 8.0);
        assert_eq!(conn.wpimult(), 2.0);
    }

    #[test]
    fn test_filter_cake_defaults() {
        let mut conn = connection(0);
        assert_eq!(conn.filter_cake_radius(), None);

        conn.set_filter_cake(FilterCake {
            geometry: FilterCakeGeometry::Radial,
            ..FilterCake::default()
        });
        assert_eq!(conn.filter_cake_radius(), Some(0.1));
        assert_eq!(conn.filter_cake_area(), Some(2.0 * PI * 0.1 * 7.2));
    }

    #[test]
    fn test_equality_is_bitwise() {
        let a = connection(0);
        let mut b = connection(0);
        assert_eq!(a, b);

        b.set_skin_factor(-0.0);
        assert_ne!(a, b);
        assert_ne!(checksum_octets(&a), checksum_octets(&b));
    }

    #[test]
    fn test_round_trip() {
        let mut conn = connection(9);
        conn.set_injmult(InjMult {
            is_active: true,
            fracture_pressure: 1.0e7,
            multiplier_gradient: 0.5,
        });
        conn.attach_to_segment(1, 10.0, 2, (0.0, 1.0));
        let restored: Connection = unpack(&pack(&conn)).unwrap();
        assert_eq!(restored, conn);
    }

    #[test]
    fn test_display_dump() {
        let dump = connection(5).to_string();
        assert!(dump.starts_with("ijk: 1,2,3\n"));
        assert!(dump.contains("open_state OPEN\n"));
        assert!(dump.contains("CTF Source DeckValue\n"));
        assert!(!dump.contains("INJMULT"));
    }

    #[test]
    fn test_peaceman_cf() {
        let props = CtfProperties {
            Kh: 100.0,
            r0: 1.0,
            rw: 0.1,
            ..CtfProperties::default()
        };
        let expected = 2.0 * PI * 100.0 / (10.0f64).ln();
        assert!((props.peaceman_cf() - expected).abs() < 1e-12);
        assert!((peaceman_r0(Direction::Z, [10.0, 10.0, 1.0], [1.0, 1.0, 1.0]) - 0.28 * 200f64.sqrt() / 2.0).abs() < 1e-12);
    }
}
