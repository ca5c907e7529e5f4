//! The conversion executor.
//!
//! Interprets a pipeline description in document order, driving template
//! resolution, skip decisions, and the process runner. Loop and iterator
//! constructs fully unroll before their next sibling begins; the first
//! failure anywhere aborts the whole run.

use crate::context::{ContextInfo, ContextStore};
use crate::conversion::node::{
    DynamicParameter, ExecEachResource, ExecEachSegment, ExecEachSequence, ExecOnce, For, If,
    OperationNode, Pipe, PipelineDescription,
};
use crate::conversion::operation::{OperationInfo, OperationType, PipeOperationInfo};
use crate::conversion::skip::should_skip;
use crate::process::{ProcessRunner, RedirectPolicy};
use crate::template::{resolve, resolve_bool, Iterators};
use imfconv_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace};

/// Drives one conversion run over a description tree.
///
/// Borrows the context store for the duration of the run so the caller can
/// inspect dynamic parameters afterwards.
pub struct ConversionExecutor<'a> {
    store: &'a mut ContextStore,
    runner: ProcessRunner,
}

impl<'a> ConversionExecutor<'a> {
    pub fn new(store: &'a mut ContextStore, runner: ProcessRunner) -> Self {
        Self { store, runner }
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// Interpret the whole description, then remove delete-on-exit values.
    ///
    /// Cleanup runs on both success and failure; a cleanup problem never
    /// overrides the run's result.
    pub fn run(&mut self, description: &PipelineDescription) -> Result<()> {
        let name = description.name.as_deref().unwrap_or("conversion");
        info!(pipeline = name, "starting conversion run");
        let mut ancestors: Vec<&str> = Vec::new();
        let result = self.run_nodes(
            &description.operations,
            &ContextInfo::empty(),
            &Iterators::new(),
            &mut ancestors,
        );
        self.cleanup();
        match &result {
            Ok(()) => info!(
                pipeline = name,
                processes = self.runner.process_count(),
                "conversion run finished"
            ),
            Err(e) => error!(pipeline = name, error = %e, "conversion run failed"),
        }
        result
    }

    fn run_nodes<'d>(
        &mut self,
        nodes: &'d [OperationNode],
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
    ) -> Result<()> {
        for node in nodes {
            self.run_node(node, info, iterators, ancestors)?;
        }
        Ok(())
    }

    fn run_node<'d>(
        &mut self,
        node: &'d OperationNode,
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
    ) -> Result<()> {
        match node {
            OperationNode::ExecOnce(op) => self.exec_once(op, info, iterators, ancestors),
            OperationNode::DynamicParameter(dp) => self.write_dynamic(dp, info, iterators, ancestors),
            OperationNode::For(f) => self.run_for(f, info, iterators, ancestors),
            OperationNode::If(n) => self.run_if(n, info, iterators, ancestors),
            OperationNode::Pipe(p) => self.run_pipe(p, info, iterators, ancestors),
            OperationNode::ExecEachSegment(n) => self.run_each_segment(n, info, iterators, ancestors),
            OperationNode::ExecEachSequence(n) => self.run_each_sequence(n, info, iterators, ancestors),
            OperationNode::ExecEachResource(n) => self.run_each_resource(n, info, iterators, ancestors),
        }
    }

    /// Run children with the container's skip expression on the ancestor
    /// chain.
    fn run_children<'d>(
        &mut self,
        skip: Option<&'d str>,
        operations: &'d [OperationNode],
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
    ) -> Result<()> {
        if let Some(expr) = skip {
            ancestors.push(expr);
        }
        let result = self.run_nodes(operations, info, iterators, ancestors);
        if skip.is_some() {
            ancestors.pop();
        }
        result
    }

    fn exec_once(
        &mut self,
        op: &ExecOnce,
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &[&str],
    ) -> Result<()> {
        let built = self.build_operation(op, OperationType::Once, info, iterators, ancestors)?;
        if built.skip {
            debug!(operation = %op.name, "operation skipped");
            return Ok(());
        }
        self.runner.run_once(&built)
    }

    fn write_dynamic(
        &mut self,
        dp: &DynamicParameter,
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &[&str],
    ) -> Result<()> {
        if should_skip(dp.skip.as_deref(), ancestors, info, self.store, iterators)? {
            trace!(name = %dp.name, "dynamic parameter skipped");
            return Ok(());
        }
        if dp.concat {
            self.store
                .append_dynamic_parameter(&dp.name, &dp.value, dp.delete_on_exit, info, iterators)
        } else {
            self.store
                .add_dynamic_parameter(&dp.name, &dp.value, dp.delete_on_exit, info, iterators)
        }
    }

    fn run_for<'d>(
        &mut self,
        f: &'d For,
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
    ) -> Result<()> {
        let (from, repetitions) = self.loop_bounds(f, info, iterators)?;
        if repetitions <= 0 {
            trace!(iterator = %f.iterator, "for loop has no repetitions");
            return Ok(());
        }
        for step in 0..repetitions {
            let bound = iterators.bind(&f.iterator, from + step);
            self.run_children(f.skip.as_deref(), &f.operations, info, &bound, ancestors)?;
        }
        Ok(())
    }

    fn run_if<'d>(
        &mut self,
        n: &'d If,
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
    ) -> Result<()> {
        if !resolve_bool(&n.test, info, self.store, iterators)? {
            trace!(test = %n.test, "if test false, subtree skipped");
            return Ok(());
        }
        self.run_children(n.skip.as_deref(), &n.operations, info, iterators, ancestors)
    }

    fn run_each_segment<'d>(
        &mut self,
        n: &'d ExecEachSegment,
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
    ) -> Result<()> {
        for id in self.store.segments().uuids() {
            let scoped = ContextInfo {
                segment: Some(id),
                ..*info
            };
            self.run_children(n.skip.as_deref(), &n.operations, &scoped, iterators, ancestors)?;
        }
        Ok(())
    }

    fn run_each_sequence<'d>(
        &mut self,
        n: &'d ExecEachSequence,
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
    ) -> Result<()> {
        for id in self.store.sequences().uuids(n.seq_type) {
            let scoped = ContextInfo {
                sequence: Some(id),
                sequence_type: Some(n.seq_type),
                ..*info
            };
            self.run_children(n.skip.as_deref(), &n.operations, &scoped, iterators, ancestors)?;
        }
        Ok(())
    }

    fn run_each_resource<'d>(
        &mut self,
        n: &'d ExecEachResource,
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
    ) -> Result<()> {
        let (Some(segment), Some(sequence)) = (info.segment, info.sequence) else {
            return Err(Error::execution(
                "each-resource iteration outside a (segment, sequence) scope",
            ));
        };
        for id in self.store.resources().uuids(segment, sequence) {
            let scoped = ContextInfo {
                resource: Some(id),
                ..*info
            };
            self.run_children(n.skip.as_deref(), &n.operations, &scoped, iterators, ancestors)?;
        }
        Ok(())
    }

    fn run_pipe<'d>(
        &mut self,
        pipe: &'d Pipe,
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
    ) -> Result<()> {
        if let Some(expr) = pipe.skip.as_deref() {
            ancestors.push(expr);
        }
        let built = self.build_pipe(pipe, info, iterators, ancestors);
        if pipe.skip.is_some() {
            ancestors.pop();
        }
        let built = built?;
        if built.stages().is_empty() {
            debug!("pipe fully skipped");
            return Ok(());
        }
        self.runner.run_pipeline(&built)
    }

    /// Resolve a pipe into its flattened stage chain.
    ///
    /// Tail stages are built first, then each cycle child contributes one
    /// group per iteration. Dynamic parameter nodes inside the cycle apply
    /// immediately, so later stages of the same build see their writes.
    fn build_pipe<'d>(
        &mut self,
        pipe: &'d Pipe,
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
    ) -> Result<PipeOperationInfo> {
        let redirect = pipe.redirect.unwrap_or(if pipe.output.is_some() {
            RedirectPolicy::File
        } else {
            RedirectPolicy::ErrLog
        });
        let redirect_file = match pipe.output.as_deref() {
            Some(tpl) => Some(PathBuf::from(resolve(tpl, info, self.store, iterators)?)),
            None => None,
        };
        let mut built = PipeOperationInfo::new(redirect, redirect_file);
        for op in &pipe.tail {
            let stage = self.build_operation(op, OperationType::PipeTail, info, iterators, ancestors)?;
            built.push_tail(stage);
        }
        if let Some(cycle) = &pipe.cycle {
            self.build_cycle_groups(cycle, info, iterators, ancestors, &mut built)?;
        }
        Ok(built)
    }

    /// Walk the top level of a pipe's cycle, structuring stages into groups.
    ///
    /// Each iteration of a loop or each-coordinate construct becomes one
    /// group; a bare exec node becomes a singleton group; an if descends
    /// without breaking the grouping.
    fn build_cycle_groups<'d>(
        &mut self,
        nodes: &'d [OperationNode],
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
        built: &mut PipeOperationInfo,
    ) -> Result<()> {
        for node in nodes {
            match node {
                OperationNode::ExecOnce(op) => {
                    let stage =
                        self.build_operation(op, OperationType::PipeCycle, info, iterators, ancestors)?;
                    built.push_cycle(vec![stage]);
                }
                OperationNode::DynamicParameter(dp) => {
                    self.write_dynamic(dp, info, iterators, ancestors)?;
                }
                OperationNode::If(n) => {
                    if resolve_bool(&n.test, info, self.store, iterators)? {
                        if let Some(expr) = n.skip.as_deref() {
                            ancestors.push(expr);
                        }
                        let result =
                            self.build_cycle_groups(&n.operations, info, iterators, ancestors, built);
                        if n.skip.is_some() {
                            ancestors.pop();
                        }
                        result?;
                    }
                }
                OperationNode::For(f) => {
                    let (from, repetitions) = self.loop_bounds(f, info, iterators)?;
                    for step in 0..repetitions {
                        let bound = iterators.bind(&f.iterator, from + step);
                        self.build_one_group(
                            f.skip.as_deref(),
                            &f.operations,
                            info,
                            &bound,
                            ancestors,
                            built,
                        )?;
                    }
                }
                OperationNode::ExecEachSegment(n) => {
                    for id in self.store.segments().uuids() {
                        let scoped = ContextInfo {
                            segment: Some(id),
                            ..*info
                        };
                        self.build_one_group(
                            n.skip.as_deref(),
                            &n.operations,
                            &scoped,
                            iterators,
                            ancestors,
                            built,
                        )?;
                    }
                }
                OperationNode::ExecEachSequence(n) => {
                    for id in self.store.sequences().uuids(n.seq_type) {
                        let scoped = ContextInfo {
                            sequence: Some(id),
                            sequence_type: Some(n.seq_type),
                            ..*info
                        };
                        self.build_one_group(
                            n.skip.as_deref(),
                            &n.operations,
                            &scoped,
                            iterators,
                            ancestors,
                            built,
                        )?;
                    }
                }
                OperationNode::ExecEachResource(n) => {
                    let (Some(segment), Some(sequence)) = (info.segment, info.sequence) else {
                        return Err(Error::execution(
                            "each-resource iteration outside a (segment, sequence) scope",
                        ));
                    };
                    for id in self.store.resources().uuids(segment, sequence) {
                        let scoped = ContextInfo {
                            resource: Some(id),
                            ..*info
                        };
                        self.build_one_group(
                            n.skip.as_deref(),
                            &n.operations,
                            &scoped,
                            iterators,
                            ancestors,
                            built,
                        )?;
                    }
                }
                OperationNode::Pipe(_) => {
                    return Err(Error::execution(
                        "a pipe cannot nest inside another pipe's cycle",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Collect one iteration's stages into a fresh group.
    fn build_one_group<'d>(
        &mut self,
        skip: Option<&'d str>,
        nodes: &'d [OperationNode],
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
        built: &mut PipeOperationInfo,
    ) -> Result<()> {
        let mut group = Vec::new();
        self.collect_children(skip, nodes, info, iterators, ancestors, &mut group)?;
        if !group.is_empty() {
            built.push_cycle(group);
        }
        Ok(())
    }

    fn collect_children<'d>(
        &mut self,
        skip: Option<&'d str>,
        nodes: &'d [OperationNode],
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
        group: &mut Vec<OperationInfo>,
    ) -> Result<()> {
        if let Some(expr) = skip {
            ancestors.push(expr);
        }
        let result = self.collect_group(nodes, info, iterators, ancestors, group);
        if skip.is_some() {
            ancestors.pop();
        }
        result
    }

    /// Flatten a cycle-iteration subtree into one group of stages.
    fn collect_group<'d>(
        &mut self,
        nodes: &'d [OperationNode],
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &mut Vec<&'d str>,
        group: &mut Vec<OperationInfo>,
    ) -> Result<()> {
        for node in nodes {
            match node {
                OperationNode::ExecOnce(op) => {
                    let stage =
                        self.build_operation(op, OperationType::PipeCycle, info, iterators, ancestors)?;
                    group.push(stage);
                }
                OperationNode::DynamicParameter(dp) => {
                    self.write_dynamic(dp, info, iterators, ancestors)?;
                }
                OperationNode::If(n) => {
                    if resolve_bool(&n.test, info, self.store, iterators)? {
                        self.collect_children(
                            n.skip.as_deref(),
                            &n.operations,
                            info,
                            iterators,
                            ancestors,
                            group,
                        )?;
                    }
                }
                OperationNode::For(f) => {
                    let (from, repetitions) = self.loop_bounds(f, info, iterators)?;
                    for step in 0..repetitions {
                        let bound = iterators.bind(&f.iterator, from + step);
                        self.collect_children(
                            f.skip.as_deref(),
                            &f.operations,
                            info,
                            &bound,
                            ancestors,
                            group,
                        )?;
                    }
                }
                OperationNode::ExecEachSegment(n) => {
                    for id in self.store.segments().uuids() {
                        let scoped = ContextInfo {
                            segment: Some(id),
                            ..*info
                        };
                        self.collect_children(
                            n.skip.as_deref(),
                            &n.operations,
                            &scoped,
                            iterators,
                            ancestors,
                            group,
                        )?;
                    }
                }
                OperationNode::ExecEachSequence(n) => {
                    for id in self.store.sequences().uuids(n.seq_type) {
                        let scoped = ContextInfo {
                            sequence: Some(id),
                            sequence_type: Some(n.seq_type),
                            ..*info
                        };
                        self.collect_children(
                            n.skip.as_deref(),
                            &n.operations,
                            &scoped,
                            iterators,
                            ancestors,
                            group,
                        )?;
                    }
                }
                OperationNode::ExecEachResource(n) => {
                    let (Some(segment), Some(sequence)) = (info.segment, info.sequence) else {
                        return Err(Error::execution(
                            "each-resource iteration outside a (segment, sequence) scope",
                        ));
                    };
                    for id in self.store.resources().uuids(segment, sequence) {
                        let scoped = ContextInfo {
                            resource: Some(id),
                            ..*info
                        };
                        self.collect_children(
                            n.skip.as_deref(),
                            &n.operations,
                            &scoped,
                            iterators,
                            ancestors,
                            group,
                        )?;
                    }
                }
                OperationNode::Pipe(_) => {
                    return Err(Error::execution(
                        "a pipe cannot nest inside another pipe's cycle",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Evaluate skip, then resolve the command and output templates.
    ///
    /// A skipped operation comes back with `skip` set and nothing resolved.
    fn build_operation(
        &self,
        op: &ExecOnce,
        op_type: OperationType,
        info: &ContextInfo,
        iterators: &Iterators,
        ancestors: &[&str],
    ) -> Result<OperationInfo> {
        let skip = should_skip(op.skip.as_deref(), ancestors, info, self.store, iterators)?;
        let redirect = op.redirect.unwrap_or(if op.output.is_some() {
            RedirectPolicy::File
        } else {
            RedirectPolicy::ErrLog
        });
        if skip {
            return Ok(OperationInfo {
                name: op.name.clone(),
                op_type,
                value: String::new(),
                context: *info,
                skip: true,
                redirect,
                redirect_file: None,
            });
        }
        let value = resolve(&op.value, info, self.store, iterators)?;
        let redirect_file = match op.output.as_deref() {
            Some(tpl) => Some(PathBuf::from(resolve(tpl, info, self.store, iterators)?)),
            None => None,
        };
        Ok(OperationInfo {
            name: op.name.clone(),
            op_type,
            value,
            context: *info,
            skip: false,
            redirect,
            redirect_file,
        })
    }

    fn loop_bounds(&self, f: &For, info: &ContextInfo, iterators: &Iterators) -> Result<(i64, i64)> {
        let from = self.resolve_int(&f.from, "from", info, iterators)?;
        let to = self.resolve_int(&f.to, "to", info, iterators)?;
        let count = self.resolve_int(&f.count, "count", info, iterators)?;
        let repetitions = if count != 0 { count } else { to - from };
        Ok((from, repetitions))
    }

    fn resolve_int(
        &self,
        raw: &str,
        what: &str,
        info: &ContextInfo,
        iterators: &Iterators,
    ) -> Result<i64> {
        let value = resolve(raw, info, self.store, iterators)?;
        value.trim().parse::<i64>().map_err(|_| {
            Error::execution(format!("for-loop {what} value '{value}' is not an integer"))
        })
    }

    /// Remove files and directories named by delete-on-exit parameters.
    fn cleanup(&mut self) {
        for path in self.store.dynamic().delete_on_exit_values() {
            let target = Path::new(path);
            if !target.exists() {
                continue;
            }
            let removed = if target.is_dir() {
                std::fs::remove_dir_all(target)
            } else {
                std::fs::remove_file(target)
            };
            match removed {
                Ok(()) => debug!(path, "removed delete-on-exit value"),
                Err(e) => debug!(path, error = %e, "failed to remove delete-on-exit value"),
            }
        }
    }
}
