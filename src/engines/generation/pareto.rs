//! NSGA-II ranking of fitness tuples: non-dominated fronts, then crowding
//! distance inside each front. Every objective is maximised.

/// Position of one individual in the Pareto ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParetoRank {
    /// Front index, 0 for the non-dominated set.
    pub front: usize,
    /// Normalised gap to the neighbours on the same front; boundary points
    /// are infinite.
    pub crowding: f64,
}

impl ParetoRank {
    /// Crowded-comparison order: lower front first, then larger crowding.
    pub fn beats(&self, other: &ParetoRank) -> bool {
        self.front < other.front || (self.front == other.front && self.crowding > other.crowding)
    }
}

/// `a` is no worse than `b` on every objective and better on at least one.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b) {
        if x < y {
            return false;
        }
        if x > y {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Indices grouped by front, best front first.
pub fn non_dominated_fronts(objectives: &[Vec<f64>]) -> Vec<Vec<usize>> {
    let n = objectives.len();
    let mut dominated_by = vec![0usize; n];
    let mut dominates_list: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(&objectives[i], &objectives[j]) {
                dominates_list[i].push(j);
                dominated_by[j] += 1;
            } else if dominates(&objectives[j], &objectives[i]) {
                dominates_list[j].push(i);
                dominated_by[i] += 1;
            }
        }
    }

    let mut fronts = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| dominated_by[i] == 0).collect();
    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            for &j in &dominates_list[i] {
                dominated_by[j] -= 1;
                if dominated_by[j] == 0 {
                    next.push(j);
                }
            }
        }
        fronts.push(current);
        current = next;
    }
    fronts
}

/// Crowding distance of each member of `front`, in the order given.
pub fn crowding_distances(objectives: &[Vec<f64>], front: &[usize]) -> Vec<f64> {
    let size = front.len();
    if size <= 2 {
        return vec![f64::INFINITY; size];
    }

    let mut distance = vec![0.0; size];
    let dims = objectives[front[0]].len();
    for dim in 0..dims {
        let mut order: Vec<usize> = (0..size).collect();
        order.sort_by(|&a, &b| objectives[front[a]][dim].total_cmp(&objectives[front[b]][dim]));

        let low = objectives[front[order[0]]][dim];
        let high = objectives[front[order[size - 1]]][dim];
        distance[order[0]] = f64::INFINITY;
        distance[order[size - 1]] = f64::INFINITY;

        let range = high - low;
        if range.abs() < 1e-10 {
            continue;
        }
        for w in order.windows(3) {
            let gap = objectives[front[w[2]]][dim] - objectives[front[w[0]]][dim];
            distance[w[1]] += gap / range;
        }
    }
    distance
}

/// Pareto rank of every objective vector, aligned with the input.
pub fn rank_objectives(objectives: &[Vec<f64>]) -> Vec<ParetoRank> {
    let mut ranks = vec![
        ParetoRank {
            front: 0,
            crowding: 0.0
        };
        objectives.len()
    ];
    for (front_index, front) in non_dominated_fronts(objectives).iter().enumerate() {
        for (&i, crowding) in front.iter().zip(crowding_distances(objectives, front)) {
            ranks[i] = ParetoRank {
                front: front_index,
                crowding,
            };
        }
    }
    ranks
}
