use super::receiver::Receiver;
use crate::error::Result;
use crate::sieve::queue::SeedQueue;
use crate::sieve::titrator::Titrator;
use crate::subset::Subset;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// the coordinator's pipeline: one thread receives frames and feeds the
/// queue, the caller's thread drains the queue into the titrator. when the
/// last sender closes, the leftover queue is drained once more and the
/// titrator's best bucket is weighed against the best local solution.
///
/// with `stop_early` the consumer half quits as soon as the titrator stops
/// accepting; otherwise seeds keep flowing so every sender can finish its
/// stream.
pub fn resolve_stream<R, T>(receiver: &mut R, titrator: &mut T, stop_early: bool) -> Result<Subset>
where
    R: Receiver + ?Sized,
    T: Titrator + ?Sized,
{
    let queue = SeedQueue::default();
    let receiving = AtomicBool::new(true);
    let consuming = AtomicBool::new(true);
    std::thread::scope(|scope| -> Result<()> {
        let intake = scope.spawn(|| -> Result<()> {
            while receiving.load(Ordering::SeqCst) && consuming.load(Ordering::SeqCst) {
                match receiver.receive(&receiving) {
                    Ok(Some(seed)) => queue.push(seed),
                    Ok(None) => continue,
                    Err(e) => {
                        receiving.store(false, Ordering::SeqCst);
                        return Err(e);
                    }
                }
            }
            Ok(())
        });
        while receiving.load(Ordering::SeqCst) && consuming.load(Ordering::SeqCst) {
            if queue.is_empty() {
                std::thread::yield_now();
                continue;
            }
            let accepting = titrator.process(&queue);
            consuming.store(accepting || !stop_early, Ordering::SeqCst);
        }
        intake.join().expect("receiving thread")?;
        // the queue may still hold seeds that arrived after the last pass
        titrator.process(&queue);
        Ok(())
    })?;
    let streamed = titrator.finalize();
    let local = receiver.best_local();
    log::info!(
        "streamed solution scored {}, best local scored {}",
        streamed.score(),
        local.score()
    );
    match local.score() > streamed.score() {
        true => Ok(local),
        false => Ok(streamed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::codec::RowCodec;
    use crate::data::row::Row;
    use crate::data::store::Segmented;
    use crate::sieve::titrator::LazyInit;
    use crate::sieve::titrator::SieveStreaming;
    use crate::sieve::titrator::ThreeSieve;
    use crate::wire::courier::links;
    use crate::wire::receiver::RoundRobin;
    use crate::wire::sender::StreamingSubset;

    fn rows() -> Vec<Row> {
        vec![
            Row::dense(vec![4.0, 17.0, 20.0, 1.0, 4.0, 21.0]),
            Row::dense(vec![5.0, 7.0, 31.0, 45.0, 3.0, 24.0]),
            Row::dense(vec![2.632, 5.126, 73.0, 15.0, 15.0, 4.0]),
            Row::dense(vec![12.0, 6.0, 47.0, 32.0, 74.0, 4.0]),
            Row::dense(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            Row::dense(vec![6.0, 31.0, 54.0, 3.5, 23.0, 57.0]),
        ]
    }

    /// every worker greedy-streams its shard while the coordinator titrates
    fn streamed<T: Titrator>(titrator: &mut T, assignment: &[usize; 6], world: usize) -> Subset {
        let (mut couriers, feeds) = links(world);
        let mut receiver = RoundRobin::new(feeds, &RowCodec::dense());
        std::thread::scope(|scope| {
            for rank in (0..world).rev() {
                let courier = couriers.remove(rank);
                let assignment = assignment.to_vec();
                scope.spawn(move || {
                    let shard = Segmented::shard(rows(), &assignment, rank).expect("shard");
                    let calc = crate::kernel::relevance::NaiveRelevance::from(&shard);
                    let mut local = StreamingSubset::new(&shard, courier);
                    crate::greedy::select(
                        crate::config::Algorithm::Fast,
                        0.01,
                        &mut local,
                        &calc,
                        &shard,
                        4,
                    );
                    local.finalize();
                });
            }
            resolve_stream(&mut receiver, titrator, false).expect("stream")
        })
    }

    #[test]
    fn sieve_streaming_beats_the_half_bound() {
        let assignment = [0, 1, 0, 1, 0, 1];
        let mut titrator = LazyInit::new(|delta| {
            Box::new(SieveStreaming::with_known_delta(4, 0.1, delta)) as Box<dyn Titrator>
        });
        let solution = streamed(&mut titrator, &assignment, 2);
        let optimum = crate::greedy::tests::run(
            crate::config::Algorithm::Naive,
            &crate::greedy::tests::fixture(),
            4,
            0.1,
        );
        assert!(!solution.is_empty());
        assert!(
            solution.score() >= (0.5 - 0.1) * optimum.score(),
            "streamed {} against optimum {}",
            solution.score(),
            optimum.score()
        );
    }

    #[test]
    fn three_sieve_beats_the_half_bound() {
        let assignment = [0, 1, 0, 1, 0, 1];
        let mut titrator = LazyInit::new(|delta| {
            Box::new(ThreeSieve::with_known_delta(4, 0.1, 2, delta)) as Box<dyn Titrator>
        });
        let solution = streamed(&mut titrator, &assignment, 2);
        let optimum = crate::greedy::tests::run(
            crate::config::Algorithm::Naive,
            &crate::greedy::tests::fixture(),
            4,
            0.1,
        );
        assert!(
            solution.score() >= (0.5 - 0.1) * optimum.score(),
            "streamed {} against optimum {}",
            solution.score(),
            optimum.score()
        );
    }

    #[test]
    fn single_sender_stream_terminates() {
        let assignment = [0; 6];
        let mut titrator = LazyInit::new(|delta| {
            Box::new(SieveStreaming::with_known_delta(3, 0.1, delta)) as Box<dyn Titrator>
        });
        let solution = streamed(&mut titrator, &assignment, 1);
        assert!(solution.len() <= 3);
        assert!(solution.score() > 0.0);
    }
}
