use super::interval_set::IntervalSet;
use crate::basic_types::DomainWipeout;
use crate::squash_assert_moderate;
use crate::squash_assert_simple;

/// The value of a set domain: a glb/lub bracket plus a cardinality interval.
/// `glb` is the guaranteed-included subset, `lub` the maximal-possible
/// superset; the variable is assigned when the two coincide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SetValue {
    pub(crate) glb: IntervalSet,
    pub(crate) lub: IntervalSet,
    pub(crate) card_min: i32,
    pub(crate) card_max: i32,
}

impl SetValue {
    /// Restores the representation invariants after a mutation, or reports a
    /// wipeout. The cardinality interval is clamped to `[|glb|, |lub|]`, and
    /// a cardinality bound meeting a bracket size collapses the bracket:
    /// `|lub| == card_min` forces the glb up to the lub, `|glb| == card_max`
    /// forces the lub down to the glb.
    pub(crate) fn refined(mut self) -> Result<SetValue, DomainWipeout> {
        if !self.glb.is_subset_of(&self.lub) {
            return Err(DomainWipeout);
        }

        loop {
            let glb_size = self.glb.size() as i32;
            let lub_size = self.lub.size() as i32;
            self.card_min = self.card_min.max(glb_size);
            self.card_max = self.card_max.min(lub_size);

            if self.card_min > self.card_max {
                return Err(DomainWipeout);
            }

            if lub_size == self.card_min && glb_size != lub_size {
                self.glb = self.lub.clone();
                continue;
            }
            if glb_size == self.card_max && lub_size != glb_size {
                self.lub = self.glb.clone();
                continue;
            }

            return Ok(self);
        }
    }
}

/// The domain of a set variable, versioned the same way as [`super::IntDomain`]:
/// a mutation stamp and a stack of saved pre-mutation values, one per level
/// the domain was narrowed at.
#[derive(Clone, Debug)]
pub struct SetDomain {
    value: SetValue,
    stamp: u32,
    saved: Vec<(u32, SetValue)>,
}

impl SetDomain {
    /// A set variable ranging from the empty set to `universe`.
    pub(crate) fn new(universe: IntervalSet) -> Self {
        let card_max = universe.size() as i32;
        SetDomain {
            value: SetValue {
                glb: IntervalSet::empty(),
                lub: universe,
                card_min: 0,
                card_max,
            },
            stamp: 0,
            saved: Vec::new(),
        }
    }

    pub fn glb(&self) -> &IntervalSet {
        &self.value.glb
    }

    pub fn lub(&self) -> &IntervalSet {
        &self.value.lub
    }

    pub fn card_min(&self) -> i32 {
        self.value.card_min
    }

    pub fn card_max(&self) -> i32 {
        self.value.card_max
    }

    /// A set variable is assigned when every possible element is guaranteed.
    pub fn is_singleton(&self) -> bool {
        self.value.glb == self.value.lub
    }

    pub fn stamp(&self) -> u32 {
        self.stamp
    }

    pub(crate) fn value(&self) -> &SetValue {
        &self.value
    }

    pub(crate) fn save_at(&mut self, level: u32) {
        squash_assert_moderate!(self.stamp < level);
        self.saved.push((self.stamp, self.value.clone()));
        self.stamp = level;
    }

    pub(crate) fn restore_saved(&mut self) {
        let (stamp, value) = self
            .saved
            .pop()
            .expect("a trail entry exists only if a state was saved");
        self.stamp = stamp;
        self.value = value;
    }

    pub(crate) fn commit(&mut self, value: SetValue) {
        squash_assert_simple!(value.glb.is_subset_of(&value.lub));
        self.value = value;
    }
}
