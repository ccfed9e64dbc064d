//! Maps solver output back onto the routes that were submitted.

use std::collections::HashSet;

use crate::errors::ReconcileError;
use crate::models::{EntityId, Route};
use crate::solver::{SolverInput, SolverOutput};

/// Turn the solver's id list into full routes in flight order.
///
/// Each returned id must match exactly one submitted route and appear once.
/// `order` is the id's position in the solver output.
pub fn reconcile(input: &SolverInput, output: &SolverOutput) -> Result<Vec<Route>, ReconcileError> {
    let mut seen = HashSet::with_capacity(output.routes.len());
    let mut plan = Vec::with_capacity(output.routes.len());

    for (position, &route_id) in output.routes.iter().enumerate() {
        if !seen.insert(route_id) {
            return Err(ReconcileError::DuplicateRoute { route_id });
        }

        let mut matches = input
            .aeac_routes
            .iter()
            .filter(|route| route.id == EntityId::Persisted(route_id));

        let route = match (matches.next(), matches.count()) {
            (Some(route), 0) => route,
            (None, _) => return Err(ReconcileError::UnknownRoute { route_id }),
            (Some(_), extra) => {
                return Err(ReconcileError::AmbiguousRoute {
                    route_id,
                    matches: extra + 1,
                })
            }
        };

        plan.push(route.clone().with_order(position as u32));
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{ReRouter, RouteFinder};

    fn route(id: i64, number: u32) -> Route {
        Route {
            id: EntityId::Persisted(id),
            number,
            start_waypoint: "alpha".to_string(),
            end_waypoint: "beta".to_string(),
            passengers: 2,
            max_vehicle_weight: 300.0,
            value: 10.0 * f64::from(number),
            remarks: String::new(),
            order: None,
        }
    }

    fn input_with(routes: Vec<Route>) -> SolverInput {
        SolverInput {
            num_waypoints: 0,
            num_routes: routes.len(),
            waypoints: Vec::new(),
            routes: Vec::new(),
            route_finder: RouteFinder::default(),
            re_router: ReRouter::default(),
            aeac_routes: routes,
        }
    }

    #[test]
    fn orders_routes_by_output_position() {
        let input = input_with(vec![route(1, 10), route(2, 20), route(3, 30)]);
        let output = SolverOutput { routes: vec![3, 1, 2] };

        let plan = reconcile(&input, &output).unwrap();

        let ids: Vec<_> = plan.iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![EntityId::Persisted(3), EntityId::Persisted(1), EntityId::Persisted(2)]
        );
        let orders: Vec<_> = plan.iter().map(|r| r.order).collect();
        assert_eq!(orders, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(plan[0].number, 30);
    }

    #[test]
    fn solver_may_skip_routes() {
        let input = input_with(vec![route(1, 10), route(2, 20), route(3, 30)]);
        let plan = reconcile(&input, &SolverOutput { routes: vec![2] }).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].order, Some(0));
    }

    #[test]
    fn unknown_id_fails() {
        let input = input_with(vec![route(1, 10)]);
        let err = reconcile(&input, &SolverOutput { routes: vec![1, 9] }).unwrap_err();
        assert_eq!(err, ReconcileError::UnknownRoute { route_id: 9 });
    }

    #[test]
    fn repeated_id_fails() {
        let input = input_with(vec![route(1, 10), route(2, 20)]);
        let err = reconcile(&input, &SolverOutput { routes: vec![1, 2, 1] }).unwrap_err();
        assert_eq!(err, ReconcileError::DuplicateRoute { route_id: 1 });
    }

    #[test]
    fn ambiguous_id_fails() {
        let input = input_with(vec![route(4, 10), route(4, 11)]);
        let err = reconcile(&input, &SolverOutput { routes: vec![4] }).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::AmbiguousRoute {
                route_id: 4,
                matches: 2
            }
        );
    }
}
