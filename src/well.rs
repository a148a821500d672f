//! Wells and their connection lists

use serde::{Deserialize, Serialize};

use crate::connection::{Connection, Order};

/// The connections of one well
///
/// Connections are stored in simulation order. The input order of ordinary
/// wells and the segment order of segmented wells are both recoverable
/// through the connection sort values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WellConnections {
    ordering: Order,
    head_i: usize,
    head_j: usize,
    connections: Vec<Connection>,
}

crate::persist_fields!(WellConnections {
    ordering,
    head_i,
    head_j,
    connections,
});

impl WellConnections {
    /// Create an empty connection list for a well head
    pub fn new(ordering: Order, head_i: usize, head_j: usize) -> Self {
        Self {
            ordering,
            head_i,
            head_j,
            connections: Vec::new(),
        }
    }

    /// Rebuild the list from restart connections
    ///
    /// Restart files hold the connections in input order, which is the
    /// segment order for segmented wells. The restart index becomes the sort
    /// value, so the reloaded simulation order equals both the restart order
    /// and the input order.
    pub fn from_restart(ordering: Order, head_i: usize, head_j: usize, mut connections: Vec<Connection>) -> Self {
        connections.sort_by_key(Connection::sort_value);
        Self {
            ordering,
            head_i,
            head_j,
            connections,
        }
    }

    pub fn ordering(&self) -> Order {
        self.ordering
    }

    pub fn set_ordering(&mut self, ordering: Order) {
        self.ordering = ordering;
    }

    pub fn set_head(&mut self, head_i: usize, head_j: usize) {
        self.head_i = head_i;
        self.head_j = head_j;
    }

    /// Add a connection or replace the one in the same cell
    ///
    /// A replaced connection keeps its sort value and completion number.
    pub fn add(&mut self, mut connection: Connection) {
        let [i, j, k] = connection.ijk();
        match self.connections.iter_mut().find(|c| c.same_coordinate(i, j, k)) {
            Some(existing) => {
                connection.set_complnum(existing.complnum());
                connection.set_sort_value(existing.sort_value());
                *existing = connection;
            }
            None => self.connections.push(connection),
        }
    }

    /// Number of connections added so far, the next insertion index
    pub fn next_insert_index(&self) -> usize {
        self.connections.len()
    }

    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<&Connection> {
        self.connections.iter().find(|c| c.same_coordinate(i, j, k))
    }

    pub fn get_mut(&mut self, i: usize, j: usize, k: usize) -> Option<&mut Connection> {
        self.connections.iter_mut().find(|c| c.same_coordinate(i, j, k))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Connection> {
        self.connections.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Whether any connection is attached to a segment
    pub fn segmented(&self) -> bool {
        self.connections.iter().any(Connection::attached_to_segment)
    }

    /// Sort the connections into simulation order
    pub fn order(&mut self) {
        if self.connections.is_empty() {
            return;
        }
        if self.segmented() {
            self.connections.sort_by_key(Connection::sort_value);
            return;
        }
        match self.ordering {
            Order::Input => self.connections.sort_by_key(Connection::sort_value),
            Order::Depth => self
                .connections
                .sort_by(|a, b| a.depth().total_cmp(&b.depth()).then(a.sort_value().cmp(&b.sort_value()))),
            Order::Track => self.order_track(),
        }
    }

    // Start at the shallowest connection and walk to the nearest remaining cell.
    fn order_track(&mut self) {
        let mut remaining = std::mem::take(&mut self.connections);
        remaining.sort_by_key(Connection::sort_value);

        let mut first = 0;
        for (index, conn) in remaining.iter().enumerate() {
            if conn.depth() < remaining[first].depth() {
                first = index;
            }
        }
        let mut ordered = Vec::with_capacity(remaining.len());
        ordered.push(remaining.remove(first));

        while !remaining.is_empty() {
            let last = ordered[ordered.len() - 1].ijk();
            let mut nearest = 0;
            let mut best = usize::MAX;
            for (index, conn) in remaining.iter().enumerate() {
                let distance = cell_distance(last, conn.ijk());
                if distance < best {
                    best = distance;
                    nearest = index;
                }
            }
            ordered.push(remaining.remove(nearest));
        }
        self.connections = ordered;
    }

    /// Connections in input order
    ///
    /// For segmented wells this is the segment order, which is also what a
    /// reloaded restart presents as input.
    pub fn input_order(&self) -> Vec<&Connection> {
        let mut connections: Vec<&Connection> = self.connections.iter().collect();
        connections.sort_by_key(|c| c.sort_value());
        connections
    }

    /// Connections in the order written to a restart file
    pub fn restart_order(&self) -> Vec<&Connection> {
        self.input_order()
    }

    /// Mark every connection as subject to WELPI scaling
    ///
    /// Returns whether any connection was newly marked.
    pub fn prepare_well_pi_scaling(&mut self) -> bool {
        self.connections
            .iter_mut()
            .fold(false, |update, conn| conn.prepare_well_pi_scaling() || update)
    }

    /// Scale every marked connection, returning how many were scaled
    pub fn apply_well_pi_scaling(&mut self, scale_factor: f64) -> usize {
        self.connections
            .iter_mut()
            .map(|conn| conn.apply_well_pi_scaling(scale_factor))
            .filter(|scaled| *scaled)
            .count()
    }
}

fn cell_distance(a: [usize; 3], b: [usize; 3]) -> usize {
    a.iter().zip(b.iter()).map(|(x, y)| x.abs_diff(*y).pow(2)).sum()
}

/// A well defined by WELSPECS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Well {
    name: String,
    group: String,
    head_i: usize,
    head_j: usize,
    ref_depth: Option<f64>,
    preferred_phase: String,
    insert_index: usize,
    productivity_index: Option<f64>,
    connections: WellConnections,
}

crate::persist_fields!(Well {
    name,
    group,
    head_i,
    head_j,
    ref_depth,
    preferred_phase,
    insert_index,
    productivity_index,
    connections,
});

impl Well {
    /// Create a new well without connections
    pub fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        head_i: usize,
        head_j: usize,
        ref_depth: Option<f64>,
        preferred_phase: impl Into<String>,
        insert_index: usize,
    ) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            head_i,
            head_j,
            ref_depth,
            preferred_phase: preferred_phase.into(),
            insert_index,
            productivity_index: None,
            connections: WellConnections::new(Order::default(), head_i, head_j),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn head(&self) -> (usize, usize) {
        (self.head_i, self.head_j)
    }

    pub fn ref_depth(&self) -> Option<f64> {
        self.ref_depth
    }

    pub fn preferred_phase(&self) -> &str {
        &self.preferred_phase
    }

    pub fn insert_index(&self) -> usize {
        self.insert_index
    }

    /// Apply WELSPECS data to an existing well
    ///
    /// Returns whether anything changed.
    pub fn update_welspecs(
        &mut self,
        group: &str,
        head_i: usize,
        head_j: usize,
        ref_depth: Option<f64>,
        preferred_phase: &str,
    ) -> bool {
        let changed = self.group != group
            || self.head_i != head_i
            || self.head_j != head_j
            || self.ref_depth != ref_depth
            || self.preferred_phase != preferred_phase;
        self.group = group.to_string();
        self.head_i = head_i;
        self.head_j = head_j;
        self.ref_depth = ref_depth;
        self.preferred_phase = preferred_phase.to_string();
        self.connections.set_head(head_i, head_j);
        changed
    }

    pub fn connections(&self) -> &WellConnections {
        &self.connections
    }

    pub fn connections_mut(&mut self) -> &mut WellConnections {
        &mut self.connections
    }

    /// Target productivity index from WELPI
    pub fn productivity_index(&self) -> Option<f64> {
        self.productivity_index
    }

    pub fn set_productivity_index(&mut self, value: f64) {
        self.productivity_index = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{CtfKind, CtfProperties, Direction, State};

    fn conn(i: usize, j: usize, k: usize, depth: f64, sort_value: usize) -> Connection {
        Connection::new(
            [i, j, k],
            0,
            sort_value as i32 + 1,
            depth,
            State::Open,
            CtfProperties::default(),
            1,
            Direction::Z,
            CtfKind::DeckValue,
            sort_value,
            true,
        )
    }

    fn list(ordering: Order, cells: &[([usize; 3], f64)]) -> WellConnections {
        let mut connections = WellConnections::new(ordering, 0, 0);
        for (index, (ijk, depth)) in cells.iter().enumerate() {
            connections.add(conn(ijk[0], ijk[1], ijk[2], *depth, index));
        }
        connections
    }

    fn ks(connections: &WellConnections) -> Vec<usize> {
        connections.iter().map(Connection::k).collect()
    }

    #[test]
    fn test_depth_order() {
        let mut connections = list(Order::Depth, &[([0, 0, 2], 30.0), ([0, 0, 0], 10.0), ([0, 0, 1], 20.0)]);
        connections.order();
        assert_eq!(ks(&connections), vec![0, 1, 2]);
        let input: Vec<usize> = connections.input_order().iter().map(|c| c.k()).collect();
        assert_eq!(input, vec![2, 0, 1]);
    }

    #[test]
    fn test_input_order_kept() {
        let mut connections = list(Order::Input, &[([0, 0, 2], 30.0), ([0, 0, 0], 10.0)]);
        connections.order();
        assert_eq!(ks(&connections), vec![2, 0]);
    }

    #[test]
    fn test_track_order_walks_neighbours() {
        let mut connections = list(
            Order::Track,
            &[([0, 0, 3], 40.0), ([0, 0, 0], 10.0), ([0, 0, 2], 30.0), ([0, 0, 1], 20.0)],
        );
        connections.order();
        assert_eq!(ks(&connections), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_segmented_wells_use_segment_order() {
        let mut connections = list(Order::Depth, &[([0, 0, 0], 10.0), ([0, 0, 1], 20.0)]);
        connections.get_mut(0, 0, 1).unwrap().attach_to_segment(2, 20.0, 0, (0.0, 1.0));
        connections.get_mut(0, 0, 0).unwrap().attach_to_segment(3, 10.0, 1, (1.0, 2.0));
        connections.order();
        assert_eq!(ks(&connections), vec![1, 0]);
        let restart: Vec<usize> = connections.restart_order().iter().map(|c| c.k()).collect();
        assert_eq!(restart, ks(&connections));
    }

    #[test]
    fn test_same_cell_replaces_in_place() {
        let mut connections = list(Order::Input, &[([0, 0, 0], 10.0), ([0, 0, 1], 20.0)]);
        connections.add(conn(0, 0, 0, 11.0, 5));
        assert_eq!(connections.len(), 2);
        let replaced = connections.get(0, 0, 0).unwrap();
        assert_eq!(replaced.depth(), 11.0);
        assert_eq!(replaced.complnum(), 1);
    }

    #[test]
    fn test_welspecs_update_reports_change() {
        let mut well = Well::new("OP1", "G1", 1, 1, None, "OIL", 0);
        assert!(!well.update_welspecs("G1", 1, 1, None, "OIL"));
        assert!(well.update_welspecs("G2", 1, 1, None, "OIL"));
        assert_eq!(well.group(), "G2");
    }

    #[test]
    fn test_well_pi_scaling_only_marked() {
        let mut connections = list(Order::Input, &[([0, 0, 0], 10.0)]);
        assert_eq!(connections.apply_well_pi_scaling(2.0), 0);
        assert!(connections.prepare_well_pi_scaling());
        assert!(!connections.prepare_well_pi_scaling());
        assert_eq!(connections.apply_well_pi_scaling(2.0), 1);
    }
}
