use itertools::Itertools;

use ecgbit_core_rs::num::Float;

use super::{report, Engine, FALLBACK_FRACTION};
use crate::maxima::LocalMaximaFinder;
use crate::result::{Adjustment, DiagnosticKind, RefineError};

impl<M: LocalMaximaFinder> Engine<M> {
    /// Adjust R-peak positions using local maxima between each pair of consecutive peaks.
    ///
    /// Per segment [peaks[i], peaks[i + 1]), local maxima above the height threshold decide:
    /// * one maximum at least as tall as both boundary peaks replaces the closer boundary peak;
    /// * one maximum taller than exactly one boundary peak replaces the lower boundary peak;
    /// * two maxima taller than the left and right boundary peaks respectively replace both;
    /// * anything else (including three or more maxima) leaves the segment untouched.
    ///
    /// Decisions are based on the original peaks only, later segments overwrite shared slots.
    /// The adjusted sequence is not re-sorted. If at least half of the peaks changed, the
    /// fallback pass collects candidate peaks for the caller (see [`Engine::candidates`]).
    pub fn adjust<S: Float>(
        &self,
        signal: &[S],
        peaks: &[usize],
    ) -> Result<Adjustment<S>, RefineError> {
        if peaks.is_empty() {
            return Err(RefineError::NoPeaksDetected);
        }
        if let Some(&index) = peaks.iter().find(|&&x| x >= signal.len()) {
            return Err(RefineError::PeakOutOfBounds {
                index,
                len: signal.len(),
            });
        }

        let threshold = self.threshold(signal);
        let mut adjusted = peaks.to_vec();
        let mut diagnostics = Vec::new();

        for (ind, (&left, &right)) in peaks.iter().tuple_windows().enumerate() {
            let search = threshold
                .ok_or_else(|| eyre::eyre!("Signal has no finite samples"))
                .and_then(|threshold| self.search(signal, left, right, Some(threshold)));
            let (segment, maxima) = match search {
                Ok(x) => x,
                Err(err) => {
                    report(
                        DiagnosticKind::SegmentMaximaSearch,
                        left,
                        right,
                        err,
                        &mut diagnostics,
                    );
                    continue;
                }
            };

            let (rpeak_left, rpeak_right) = (signal[left], signal[right]);
            match maxima.as_slice() {
                [] => {}
                [maximum] => {
                    let pos = segment.absolute(*maximum.offset());
                    let left_diff = signal[pos] - rpeak_left;
                    let right_diff = signal[pos] - rpeak_right;

                    if left_diff >= S::zero() && right_diff >= S::zero() {
                        // Taller than both: replace the closer peak, ties go to the left one
                        if pos - left > right - pos {
                            adjusted[ind + 1] = pos;
                        } else {
                            adjusted[ind] = pos;
                        }
                    } else if left_diff * right_diff <= S::zero() {
                        // Taller than one of them: replace the lower peak
                        if rpeak_left < rpeak_right {
                            adjusted[ind] = pos;
                        } else {
                            adjusted[ind + 1] = pos;
                        }
                    }
                }
                [first, second] => {
                    let first = segment.absolute(*first.offset());
                    let second = segment.absolute(*second.offset());
                    if signal[first] - rpeak_left > S::zero()
                        && signal[second] - rpeak_right > S::zero()
                    {
                        adjusted[ind] = first;
                        adjusted[ind + 1] = second;
                    }
                }
                // Three or more maxima are ambiguous
                _ => {}
            }
        }

        let changed = peaks
            .iter()
            .zip(adjusted.iter())
            .filter(|(before, after)| before != after)
            .count();

        let candidates = if changed as f64 >= FALLBACK_FRACTION * peaks.len() as f64 {
            log::debug!(
                "{changed} out of {} R-peaks were adjusted, collecting fallback candidates",
                peaks.len()
            );
            Some(self.candidates(signal, &adjusted, &mut diagnostics))
        } else {
            None
        };

        Ok(Adjustment::new(
            peaks.to_vec(),
            adjusted,
            threshold,
            changed,
            candidates,
            diagnostics,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maxima::{LocalMaxima, Maximum};
    use crate::result::Diagnostic;

    fn signal(len: usize, at: &[(usize, f64)]) -> Vec<f64> {
        let mut signal = vec![0.0; len];
        for (pos, amplitude) in at {
            signal[*pos] = *amplitude;
        }
        signal
    }

    fn kinds(diagnostics: &[Diagnostic]) -> Vec<DiagnosticKind> {
        diagnostics.iter().map(|x| *x.kind()).collect()
    }

    const PEAKS: [usize; 4] = [2, 15, 30, 45];

    fn engine() -> Engine<LocalMaxima> {
        Engine::default()
    }

    #[test]
    fn test_no_peaks() {
        let engine = engine();
        assert_eq!(
            engine.adjust(&[0.0, 1.0, 0.0], &[]),
            Err(RefineError::NoPeaksDetected)
        );
        assert_eq!(
            engine.adjust::<f64>(&[], &[]),
            Err(RefineError::NoPeaksDetected)
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let engine = engine();
        assert_eq!(
            engine.adjust(&[0.0; 50], &[5, 50]),
            Err(RefineError::PeakOutOfBounds { index: 50, len: 50 })
        );
    }

    #[test]
    fn test_single_peak() {
        let adjustment = engine()
            .adjust(&signal(10, &[(4, 1.0)]), &[4])
            .unwrap();
        assert_eq!(adjustment.adjusted(), &vec![4]);
        assert_eq!(adjustment.changed(), &0);
        assert_eq!(adjustment.candidates(), &None);
    }

    #[test]
    fn test_dominant_maximum_replaces_closer_peak() {
        let engine = engine();

        // 8 - 2 = 6 < 15 - 8 = 7 -> left
        let ecg = signal(50, &[(2, 3.0), (15, 4.0), (8, 9.0), (30, 4.0), (45, 4.0)]);
        let adjustment = engine.adjust(&ecg, &PEAKS).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![8, 15, 30, 45]);
        assert_eq!(adjustment.original(), &PEAKS.to_vec());
        assert_eq!(adjustment.threshold(), &Some(9.0 * 0.4));
        assert_eq!(adjustment.changed(), &1);
        assert_eq!(adjustment.candidates(), &None);
        assert!(adjustment.diagnostics().is_empty());

        // 10 - 2 = 8 > 15 - 10 = 5 -> right
        let ecg = signal(50, &[(2, 3.0), (15, 4.0), (10, 9.0), (30, 4.0), (45, 4.0)]);
        let adjustment = engine.adjust(&ecg, &PEAKS).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![2, 10, 30, 45]);

        // 9 - 2 = 16 - 9 -> left
        let ecg = signal(50, &[(2, 3.0), (16, 4.0), (9, 9.0), (30, 4.0), (45, 4.0)]);
        let adjustment = engine.adjust(&ecg, &[2, 16, 30, 45]).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![9, 16, 30, 45]);
    }

    #[test]
    fn test_maximum_equal_to_peaks_counts_as_dominant() {
        // left_diff = 0, right_diff = 0 -> closer peak (right)
        let ecg = signal(50, &[(2, 5.0), (15, 5.0), (12, 5.0), (30, 5.0), (45, 5.0)]);
        let adjustment = engine().adjust(&ecg, &PEAKS).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![2, 12, 30, 45]);
    }

    #[test]
    fn test_intermediate_maximum_replaces_lower_peak() {
        let engine = engine();

        // 3 < 5 < 7 -> left peak is lower
        let ecg = signal(50, &[(2, 3.0), (15, 7.0), (8, 5.0), (30, 7.0), (45, 7.0)]);
        let adjustment = engine.adjust(&ecg, &PEAKS).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![8, 15, 30, 45]);

        // 7 > 5 > 3 -> right peak is lower
        let ecg = signal(50, &[(2, 7.0), (15, 3.0), (8, 5.0), (30, 7.0), (45, 7.0)]);
        let adjustment = engine.adjust(&ecg, &PEAKS).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![2, 8, 30, 45]);

        // left_diff = 0, right_diff < 0 -> the product is zero, left peak is lower
        let ecg = signal(50, &[(2, 5.0), (15, 7.0), (8, 5.0), (30, 7.0), (45, 7.0)]);
        let adjustment = engine.adjust(&ecg, &PEAKS).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![8, 15, 30, 45]);
    }

    #[test]
    fn test_low_maximum_is_ignored() {
        let ecg = signal(50, &[(2, 8.0), (15, 9.0), (8, 5.0), (30, 9.0), (45, 9.0)]);
        let adjustment = engine().adjust(&ecg, &PEAKS).unwrap();
        assert_eq!(adjustment.adjusted(), &PEAKS.to_vec());
        assert_eq!(adjustment.changed(), &0);
    }

    #[test]
    fn test_two_maxima_replace_both_peaks() {
        let peaks = [2, 15, 30, 45, 60, 75];
        let ecg = signal(
            80,
            &[(2, 3.0), (15, 4.0), (5, 6.0), (11, 7.0), (30, 4.0), (45, 4.0), (60, 4.0), (75, 4.0)],
        );
        let adjustment = engine().adjust(&ecg, &peaks).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![5, 11, 30, 45, 60, 75]);
        assert_eq!(adjustment.changed(), &2);
        assert_eq!(adjustment.candidates(), &None);

        // The first maximum isn't taller than the left peak
        let ecg = signal(
            80,
            &[(2, 3.0), (15, 4.0), (5, 3.0), (11, 7.0), (30, 4.0), (45, 4.0), (60, 4.0), (75, 4.0)],
        );
        let adjustment = engine().adjust(&ecg, &peaks).unwrap();
        assert_eq!(adjustment.adjusted(), &peaks.to_vec());
    }

    #[test]
    fn test_three_maxima_are_ignored() {
        let ecg = signal(
            50,
            &[(2, 3.0), (15, 4.0), (5, 6.0), (8, 6.5), (11, 7.0), (30, 4.0), (45, 4.0)],
        );
        let adjustment = engine().adjust(&ecg, &PEAKS).unwrap();
        assert_eq!(adjustment.adjusted(), &PEAKS.to_vec());
        assert!(adjustment.diagnostics().is_empty());
    }

    #[test]
    fn test_height_threshold() {
        let engine = engine();

        let ecg = signal(40, &[(0, 10.0), (10, 1.0), (20, 1.0), (30, 1.0)]);
        assert_eq!(engine.threshold(&ecg), Some(4.0));

        // Exactly at the threshold: passes, right peak is lower -> replaced
        let mut ecg = ecg;
        ecg[5] = 4.0;
        let adjustment = engine.adjust(&ecg, &[0, 10, 20, 30]).unwrap();
        assert_eq!(adjustment.threshold(), &Some(4.0));
        assert_eq!(adjustment.adjusted(), &vec![0, 5, 20, 30]);

        // Just below: nothing to adjust
        ecg[5] = 3.99;
        let adjustment = engine.adjust(&ecg, &[0, 10, 20, 30]).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![0, 10, 20, 30]);
    }

    #[test]
    fn test_custom_height_fraction() -> eyre::Result<()> {
        let ecg = signal(50, &[(2, 3.0), (15, 4.0), (8, 5.0), (30, 4.0), (45, 4.0)]);
        // 5 * 0.4 = 2 -> the maximum passes
        let adjustment = engine().adjust(&ecg, &PEAKS)?;
        assert_eq!(adjustment.adjusted(), &vec![8, 15, 30, 45]);

        // 5 * 1.0 = 5 -> still passes (inclusive)
        let adjustment = Engine::new(LocalMaxima, 1.0)?.adjust(&ecg, &PEAKS)?;
        assert_eq!(adjustment.adjusted(), &vec![8, 15, 30, 45]);

        assert!(Engine::new(LocalMaxima, 1.1).is_err());
        Ok(())
    }

    #[test]
    fn test_fallback_activation() {
        let engine = engine();
        let points = [(2, 3.0), (15, 4.0), (8, 9.0), (30, 3.0), (45, 4.0), (60, 4.0)];

        // 1 out of 4 changed
        let ecg = signal(70, &points);
        let adjustment = engine.adjust(&ecg, &PEAKS).unwrap();
        assert_eq!(adjustment.changed(), &1);
        assert_eq!(adjustment.candidates(), &None);

        // 2 out of 4 changed -> fallback
        let mut ecg = signal(70, &points);
        ecg[36] = 9.0;
        let adjustment = engine.adjust(&ecg, &PEAKS).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![8, 15, 36, 45]);
        assert_eq!(adjustment.changed(), &2);
        assert_eq!(adjustment.candidates(), &Some(vec![30]));
        assert!(adjustment.fallback());
        assert_eq!(
            kinds(adjustment.diagnostics()),
            vec![DiagnosticKind::CandidateSearch; 2]
        );

        // 2 out of 5 changed -> no fallback
        let adjustment = engine.adjust(&ecg, &[2, 15, 30, 45, 60]).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![8, 15, 36, 45, 60]);
        assert_eq!(adjustment.changed(), &2);
        assert_eq!(adjustment.candidates(), &None);
    }

    #[test]
    fn test_candidates_are_disjoint_from_adjusted() {
        let ecg = signal(
            50,
            &[(2, 3.0), (15, 4.0), (5, 6.0), (11, 7.0), (30, 4.0), (45, 4.0), (38, 1.0)],
        );
        let adjustment = engine().adjust(&ecg, &PEAKS).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![5, 11, 30, 45]);

        let candidates = adjustment.candidates().clone().unwrap();
        assert_eq!(candidates, vec![15, 38]);
        assert!(candidates.iter().all(|x| !adjustment.adjusted().contains(x)));
    }

    #[test]
    fn test_failed_segments_are_skipped() {
        let engine = engine();

        // Non-ascending pair can't form a segment
        let ecg = signal(50, &[(10, 3.0), (5, 4.0), (20, 4.0), (12, 9.0)]);
        let adjustment = engine.adjust(&ecg, &[10, 5, 20, 40]).unwrap();
        assert_eq!(adjustment.adjusted().len(), 4);
        assert_eq!(
            kinds(adjustment.diagnostics()),
            vec![DiagnosticKind::SegmentMaximaSearch]
        );
        assert_eq!(adjustment.diagnostics()[0].left(), &10);
        assert_eq!(adjustment.diagnostics()[0].right(), &5);

        // Non-finite samples in one segment only
        let mut ecg = signal(50, &[(2, 3.0), (15, 4.0), (30, 3.0), (45, 4.0), (36, 9.0)]);
        ecg[8] = f64::NAN;
        let adjustment = engine.adjust(&ecg, &PEAKS).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![2, 15, 36, 45]);
        assert_eq!(
            kinds(adjustment.diagnostics()),
            vec![DiagnosticKind::SegmentMaximaSearch]
        );
    }

    #[test]
    fn test_non_finite_signal() {
        let ecg = vec![f64::NAN; 20];
        let adjustment = engine().adjust(&ecg, &[2, 10, 18]).unwrap();
        assert_eq!(adjustment.threshold(), &None);
        assert_eq!(adjustment.adjusted(), &vec![2, 10, 18]);
        assert_eq!(adjustment.diagnostics().len(), 2);
    }

    #[test]
    fn test_custom_finder() {
        struct Broken;

        impl LocalMaximaFinder for Broken {
            fn find<S: Float>(
                &self,
                sequence: &[S],
                _: Option<S>,
            ) -> eyre::Result<Vec<Maximum<S>>> {
                Ok(vec![Maximum::new(sequence.len(), S::zero())])
            }
        }

        let engine = Engine::new(Broken, 0.4).unwrap();
        let adjustment = engine.adjust(&[0.0, 1.0, 0.0, 2.0, 0.0], &[1, 3]).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![1, 3]);
        assert_eq!(adjustment.diagnostics().len(), 1);
    }

    #[test]
    fn test_determinism() {
        let mut ecg = signal(70, &[(2, 3.0), (15, 4.0), (8, 9.0), (30, 3.0), (45, 4.0)]);
        ecg[36] = 9.0;
        let engine = engine();
        assert_eq!(engine.adjust(&ecg, &PEAKS), engine.adjust(&ecg, &PEAKS));
    }

    #[test]
    fn test_f32_signal() {
        let ecg: Vec<f32> = signal(50, &[(2, 3.0), (15, 4.0), (8, 9.0), (30, 4.0), (45, 4.0)])
            .into_iter()
            .map(|x| x as f32)
            .collect();
        let adjustment = engine().adjust(&ecg, &PEAKS).unwrap();
        assert_eq!(adjustment.adjusted(), &vec![8, 15, 30, 45]);
    }
}
