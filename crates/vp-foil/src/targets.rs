//! Viscous query points and the target lists that carry them.

/// One (cl, re) pair to resolve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViscousQueryPoint {
    pub cl: f64,
    pub reynolds: f64,
}

/// Predictor output for one query point.
///
/// `converged` is always true for surrogate predictors, which degrade
/// rather than fail to converge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViscousQueryResult {
    pub cd: f64,
    pub achieved_cl: f64,
    pub xtr_top: f64,
    pub xtr_bot: f64,
    pub converged: bool,
}

/// A caller-owned list of (cl, re) targets with result slots.
///
/// The transition parameters apply to every point in the list.
pub trait TargetList {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cl(&self, i: usize) -> f64;

    fn reynolds(&self, i: usize) -> f64;

    /// Critical amplification factor.
    fn n_crit(&self) -> f64;

    /// Forced transition on the upper surface, as a chord fraction.
    fn xtr_top(&self) -> f64;

    /// Forced transition on the lower surface, as a chord fraction.
    fn xtr_bot(&self) -> f64;

    /// Store the result for point `i`.
    fn record(&mut self, i: usize, result: ViscousQueryResult);

    fn query_point(&self, i: usize) -> ViscousQueryPoint {
        ViscousQueryPoint {
            cl: self.cl(i),
            reynolds: self.reynolds(i),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetPoint {
    pub query: ViscousQueryPoint,
    pub result: Option<ViscousQueryResult>,
}

/// Plain `TargetList` backed by a vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ViscousTargets {
    pub n_crit: f64,
    pub xtr_top: f64,
    pub xtr_bot: f64,
    pub points: Vec<TargetPoint>,
}

impl Default for ViscousTargets {
    fn default() -> Self {
        Self {
            n_crit: 9.0,
            xtr_top: 1.0,
            xtr_bot: 1.0,
            points: Vec::new(),
        }
    }
}

impl ViscousTargets {
    /// Targets with natural transition and nCrit = 9.
    pub fn new(pairs: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut targets = Self::default();
        for (cl, reynolds) in pairs {
            targets.push(cl, reynolds);
        }
        targets
    }

    pub fn with_transition(mut self, n_crit: f64, xtr_top: f64, xtr_bot: f64) -> Self {
        self.n_crit = n_crit;
        self.xtr_top = xtr_top;
        self.xtr_bot = xtr_bot;
        self
    }

    pub fn push(&mut self, cl: f64, reynolds: f64) {
        self.points.push(TargetPoint {
            query: ViscousQueryPoint { cl, reynolds },
            result: None,
        });
    }

    pub fn n_converged(&self) -> usize {
        self.points
            .iter()
            .filter(|p| p.result.is_some_and(|r| r.converged))
            .count()
    }
}

impl TargetList for ViscousTargets {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn cl(&self, i: usize) -> f64 {
        self.points[i].query.cl
    }

    fn reynolds(&self, i: usize) -> f64 {
        self.points[i].query.reynolds
    }

    fn n_crit(&self) -> f64 {
        self.n_crit
    }

    fn xtr_top(&self) -> f64 {
        self.xtr_top
    }

    fn xtr_bot(&self) -> f64 {
        self.xtr_bot
    }

    fn record(&mut self, i: usize, result: ViscousQueryResult) {
        self.points[i].result = Some(result);
    }
}
