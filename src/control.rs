//! Parameter handoff from a control thread to the audio thread.
//!
//! A [`SharedNode`] owns the node and the consumer end of a single-producer,
//! single-consumer ring buffer; a [`ControlHandle`] owns the producer end and
//! can live on a UI or MIDI thread. The node drains every pending message at
//! the start of `render_block`, so a parameter change pushed before a block
//! is always applied before any sample of that block is processed.
//!
//! ```ignore
//! let (node, mut handle) = SharedNode::new(DiodeVcfNode::lowpass(48_000.0)?);
//! // move `node` into the audio callback, keep `handle`
//! handle.set(DiodeVcfParam::Frequency, 0.4);
//! ```

use rtrb::{Consumer, Producer, RingBuffer};

use crate::graph::node::{GraphNode, Modulatable, RenderCtx};

const CONTROL_QUEUE_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamMessage<P> {
    Modulate { param: P, base: f32, modulation: f32 },
    Reset,
}

pub struct ControlHandle<P> {
    tx: Producer<ParamMessage<P>>,
}

impl<P: Copy> ControlHandle<P> {
    /// Set a parameter to `value` with no modulation.
    pub fn set(&mut self, param: P, value: f32) -> bool {
        self.modulate(param, value, 0.0)
    }

    pub fn modulate(&mut self, param: P, base: f32, modulation: f32) -> bool {
        self.send(ParamMessage::Modulate {
            param,
            base,
            modulation,
        })
    }

    /// Clear the node's audio state before its next block.
    pub fn reset(&mut self) -> bool {
        self.send(ParamMessage::Reset)
    }

    /// Free slots left in the queue.
    pub fn capacity(&self) -> usize {
        self.tx.slots()
    }

    fn send(&mut self, msg: ParamMessage<P>) -> bool {
        match self.tx.push(msg) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("control queue full, dropping message");
                false
            }
        }
    }
}

pub struct SharedNode<N: Modulatable> {
    node: N,
    rx: Consumer<ParamMessage<N::Param>>,
}

impl<N: Modulatable> SharedNode<N> {
    pub fn new(node: N) -> (Self, ControlHandle<N::Param>) {
        Self::with_capacity(node, CONTROL_QUEUE_SIZE)
    }

    pub fn with_capacity(node: N, capacity: usize) -> (Self, ControlHandle<N::Param>) {
        let (tx, rx) = RingBuffer::<ParamMessage<N::Param>>::new(capacity);
        (Self { node, rx }, ControlHandle { tx })
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut N {
        &mut self.node
    }
}

impl<N: Modulatable + GraphNode> SharedNode<N> {
    /// Apply every queued message. Returns how many were applied.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(msg) = self.rx.pop() {
            match msg {
                ParamMessage::Modulate {
                    param,
                    base,
                    modulation,
                } => self.node.apply_modulation(param, base, modulation),
                ParamMessage::Reset => self.node.reset(),
            }
            applied += 1;
        }
        applied
    }
}

impl<N: Modulatable + GraphNode> GraphNode for SharedNode<N> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.drain();
        self.node.render_block(out, ctx);
    }

    fn reset(&mut self) {
        self.node.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::ladder::MAX_RESONANCE;
    use crate::graph::diode_vcf::{DiodeVcfNode, DiodeVcfParam};
    use std::thread;

    #[test]
    fn test_messages_apply_before_render() {
        let (mut node, mut handle) = SharedNode::new(DiodeVcfNode::lowpass(48_000.0).unwrap());
        assert!(handle.set(DiodeVcfParam::Frequency, 0.25));
        assert!(handle.modulate(DiodeVcfParam::Resonance, 0.5, 0.1));

        // Nothing applied until the audio side runs
        assert_eq!(node.node().get_param(DiodeVcfParam::Frequency), 1.0);

        let mut block = [0.0; 16];
        node.render_block(&mut block, &RenderCtx::new(48_000.0));
        assert_eq!(node.node().get_param(DiodeVcfParam::Frequency), 0.25);
        assert_eq!(node.node().filter().frequency(), 0.25);
        assert!((node.node().filter().resonance() - 0.6 * MAX_RESONANCE).abs() < 1e-4);
    }

    #[test]
    fn test_full_queue_rejects() {
        let (mut node, mut handle) =
            SharedNode::with_capacity(DiodeVcfNode::lowpass(48_000.0).unwrap(), 2);
        assert!(handle.set(DiodeVcfParam::Frequency, 0.1));
        assert!(handle.set(DiodeVcfParam::Frequency, 0.2));
        assert!(!handle.set(DiodeVcfParam::Frequency, 0.3));
        assert_eq!(handle.capacity(), 0);

        assert_eq!(node.drain(), 2);
        assert_eq!(node.node().get_param(DiodeVcfParam::Frequency), 0.2);
    }

    #[test]
    fn test_handle_works_across_threads() {
        let (mut node, mut handle) = SharedNode::new(DiodeVcfNode::lowpass(48_000.0).unwrap());

        thread::spawn(move || {
            handle.set(DiodeVcfParam::Saturation, 1.0);
            handle.reset();
        })
        .join()
        .unwrap();

        assert_eq!(node.drain(), 2);
        assert_eq!(node.node().filter().saturation(), 15.0);
    }
}
