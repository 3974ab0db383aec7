use mixsel::{CategoricalData, ContinuousData, FitOutcome, MixedData, Selection, Strategy};
use rand::prelude::*;
use rand_distr::Normal;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Two populations measured on one continuous and two categorical
    // variables. The second categorical variable carries no group signal,
    // so it is left unselected and modeled globally.
    let mut rng = StdRng::seed_from_u64(17);
    let groups = [(0.0, 1.0), (6.0, 1.5)];

    let mut rows = Vec::new();
    let mut codes = Vec::new();
    for (g, &(mean, sd)) in groups.iter().enumerate() {
        let normal = Normal::new(mean, sd)?;
        for _ in 0..60 {
            // About one value in twelve is missing.
            let x = if rng.random::<f64>() < 1.0 / 12.0 {
                None
            } else {
                Some(normal.sample(&mut rng))
            };
            rows.push(vec![x]);
            let signal = if rng.random::<f64>() < 0.85 { g } else { 1 - g };
            codes.push(vec![signal, rng.random_range(0..4)]);
        }
    }

    let data = MixedData::new(
        Some(ContinuousData::from_options(&rows)?),
        Some(CategoricalData::from_codes(&codes, &[2, 4])?),
        None,
    )?;
    let selection = Selection::from_flags(&[1, 1, 0], &data)?;

    let outcome = Strategy::new()
        .with_n_candidates(50)
        .with_n_keep(10)
        .with_seed(1)
        .fit(&data, selection, 2)?;

    match outcome {
        FitOutcome::Fitted(model) => {
            println!("loglik = {:.3}", model.loglik);
            println!("bic    = {:.3}", model.bic);
            println!("icl    = {:.3}", model.icl);
            println!("pi     = {:.3}", model.pi);
            println!("mu     =\n{:.3}", model.mu);
            println!("sd     =\n{:.3}", model.sd);
            for (j, table) in model.alpha.iter().enumerate() {
                println!("alpha[{j}] =\n{table:.3}");
            }
            println!("degeneracy rate = {:.3}", model.degeneracy_rate);
        }
        FitOutcome::Exhausted { n_degenerate, .. } => {
            println!("no model: {n_degenerate} degenerate candidates");
        }
    }
    Ok(())
}
