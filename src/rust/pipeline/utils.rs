use serde::Deserialize;

/// Row normalization applied after TF-IDF weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

pub(crate) fn normalize_values(values: &mut [f32], norm: Norm) {
    let total: f32 = match norm {
        Norm::L2 => values.iter().map(|&x| x * x).sum::<f32>().sqrt(),
        Norm::L1 => values.iter().map(|x| x.abs()).sum(),
        Norm::None => return,
    };
    if total > 1e-10 {
        values.iter_mut().for_each(|x| *x /= total);
    } else {
        values.iter_mut().for_each(|x| *x = 0.0);
    }
}

/// Position of the first maximum. Ties resolve to the lowest index.
pub(crate) fn argmax(values: impl IntoIterator<Item = f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, v) in values.into_iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
