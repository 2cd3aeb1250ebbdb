use std::ops::Range;

/// Contiguous block of neurons handled by `worker_id`. When `num_neurons` does not divide
/// evenly, the first workers take one neuron more.
pub fn get_worker_range(num_workers: usize, worker_id: usize, num_neurons: usize) -> Range<usize> {
    let min_block_size = num_neurons / num_workers;
    let remainder = num_neurons % num_workers;

    let start = min_block_size * worker_id + worker_id.min(remainder);
    let block_size = if worker_id < remainder {
        min_block_size + 1
    } else {
        min_block_size
    };

    start..start + block_size
}
