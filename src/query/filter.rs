use crate::core::models::DescribeInstancesResponse;

/// Flattens a response into its instance ids, reservation by reservation.
pub fn instance_ids(response: &DescribeInstancesResponse) -> Vec<String> {
    response
        .reservations
        .iter()
        .flat_map(|reservation| reservation.instances.iter())
        .map(|instance| instance.instance_id.clone())
        .collect()
}
