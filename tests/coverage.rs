//! Coverage failures and partial solves.

use testresult::TestResult;

use cartwright::{
    countries::Country,
    fixtures::Fixture,
    items::ItemKey,
    offers::{MatrixError, builder::build_matrix, pruning::prune_offers},
    solvers::{Solver, SolverError, path::PathSolver},
};

#[test]
fn restricting_countries_can_leave_an_item_uncovered() -> TestResult {
    let fixture = Fixture::from_set("market")?;

    let matrix = prune_offers(&build_matrix(&fixture.listings(), fixture.items())?);

    // Brainstorm is only listed from the Netherlands and Malta.
    let netherlands = Country::new("Netherlands");
    let malta = Country::new("Malta");
    let restricted = matrix.retain_countries(|country| *country != netherlands && *country != malta);

    let result = PathSolver::default().solve(&restricted, fixture.items(), fixture.tiers());

    assert!(matches!(
        result,
        Err(SolverError::NoCoverage { item }) if item == "Brainstorm"
    ));

    Ok(())
}

#[test]
fn item_only_sold_from_a_country_without_shipping_is_uncovered() -> TestResult {
    let fixture = Fixture::from_set("market")?;

    let matrix = build_matrix(&fixture.listings(), fixture.items())?;
    let netherlands = Country::new("Netherlands");
    let restricted = matrix.retain_countries(|country| *country != netherlands);

    // island-cards (Malta) still lists Brainstorm, but Malta has no shipping tiers.
    assert!(restricted.offers_item(&ItemKey::new("Brainstorm")));

    let result = PathSolver::default().solve(&restricted, fixture.items(), fixture.tiers());

    assert!(matches!(
        result,
        Err(SolverError::NoCoverage { item }) if item == "Brainstorm"
    ));

    Ok(())
}

#[test]
fn partial_solve_drops_unlisted_items() -> TestResult {
    let fixture = Fixture::from_set("split")?;

    let mut desired = fixture.items().clone();
    desired.insert("Time Walk");

    let matrix = build_matrix(&fixture.listings(), &desired)?;

    assert!(matches!(
        PathSolver::default().solve(&matrix, &desired, fixture.tiers()),
        Err(SolverError::NoCoverage { item }) if item == "Time Walk"
    ));

    let dropped = desired.retain_offered(|key| matrix.offers_item(key));

    assert_eq!(dropped, vec!["Time Walk".to_string()]);

    let solution = PathSolver::default().solve(&matrix, &desired, fixture.tiers())?;

    assert_eq!(solution.steps().len(), 2);

    Ok(())
}

#[test]
fn partial_solve_drops_items_only_sold_without_shipping() -> TestResult {
    let fixture = Fixture::from_set("market")?;

    let mut desired = fixture.items().clone();
    let matrix = build_matrix(&fixture.listings(), &desired)?;
    let netherlands = Country::new("Netherlands");
    let restricted = matrix.retain_countries(|country| *country != netherlands);

    // Narrowing against the listings alone keeps Brainstorm, since Malta still lists it.
    assert!(restricted.offers_item(&ItemKey::new("Brainstorm")));

    let shippable = restricted.retain_shippable(fixture.tiers());
    let dropped = desired.retain_offered(|key| shippable.offers_item(key));

    assert_eq!(dropped, vec!["Brainstorm".to_string()]);

    let pruned = prune_offers(&restricted);
    let solution = PathSolver::default().solve(&pruned, &desired, fixture.tiers())?;

    assert_eq!(solution.steps().len(), desired.len());
    assert!(solution.seller_for(&ItemKey::new("Brainstorm")).is_none());

    Ok(())
}

#[test]
fn empty_listings_are_rejected() {
    let fixture = Fixture::default();

    assert_eq!(
        build_matrix(&[], fixture.items()),
        Err(MatrixError::NoListings)
    );
}
