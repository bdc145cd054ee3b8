use crate::config::EmitterConfig;
use crate::emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
use anyhow::{anyhow, Result};
use std::io::Write;
use stowage_core::{
    AstContext, BoolOpKind, Mutability, NodeId, NodeKind, Type, UnaryOpKind, Visibility,
};

/// Renders a tree as indented, Vyper-flavoured pseudo-source.
///
/// Storage operations print as `t = storage_read slot[k0, k1]` and `storage_write slot[k0](t)`;
/// the key brackets are left out for unkeyed slots.
pub struct SourceEmitter<'a> {
    ctx: &'a AstContext,
    config: EmitterConfig,
}

impl<'a> SourceEmitter<'a> {
    pub fn new(ctx: &'a AstContext, config: EmitterConfig) -> Self {
        Self { ctx, config }
    }

    pub fn render(&self, root: NodeId) -> Result<String> {
        self.emit_to_string(&root)
    }

    fn emit_node<W: Write>(&self, id: NodeId, w: &mut W, c: &mut EmitContext) -> EmitResult {
        match self.ctx.kind(id)? {
            NodeKind::Module { body } => {
                for (i, item) in body.iter().enumerate() {
                    let is_function = matches!(self.ctx.kind(*item)?, NodeKind::FunctionDef { .. });
                    if i > 0 && is_function {
                        EmitHelper::write_blank(w)?;
                    }
                    self.emit_node(*item, w, c)?;
                }
                Ok(())
            }
            NodeKind::FunctionDef {
                name,
                args,
                body,
                visibility,
                mutability,
            } => {
                let visibility = match visibility {
                    Visibility::External => "@external",
                    Visibility::Internal => "@internal",
                };
                EmitHelper::write_line(w, c, &EmitHelper::paint(c, visibility, "yellow"))?;
                let mutability = match mutability {
                    Mutability::Pure => Some("@pure"),
                    Mutability::View => Some("@view"),
                    Mutability::Payable => Some("@payable"),
                    Mutability::NonPayable => None,
                };
                if let Some(decorator) = mutability {
                    EmitHelper::write_line(w, c, &EmitHelper::paint(c, decorator, "yellow"))?;
                }

                let params = args
                    .iter()
                    .map(|a| self.arg(*a))
                    .collect::<Result<Vec<_>>>()?
                    .join(", ");
                let returns = match self.ctx.ty(id) {
                    Some(Type::Function(ft)) => ft
                        .returns
                        .as_ref()
                        .map(|r| format!(" -> {}", r))
                        .unwrap_or_default(),
                    _ => String::new(),
                };
                let header = format!(
                    "{} {}({}){}",
                    EmitHelper::paint(c, "def", "blue"),
                    name,
                    params,
                    returns
                );
                self.emit_compound(id, header, body, w, c)
            }
            NodeKind::If { test, body, orelse } => {
                let header = format!("{} {}", EmitHelper::paint(c, "if", "blue"), self.expr(*test)?);
                self.emit_compound(id, header, body, w, c)?;
                if !orelse.is_empty() {
                    let header = EmitHelper::paint(c, "else", "blue");
                    EmitHelper::write_block(w, c, &header, |w, c| self.emit_block(orelse, w, c))?;
                }
                Ok(())
            }
            NodeKind::For { target, iter, body } => {
                let header = format!(
                    "{} {} in {}",
                    EmitHelper::paint(c, "for", "blue"),
                    self.expr(*target)?,
                    self.expr(*iter)?
                );
                self.emit_compound(id, header, body, w, c)
            }
            _ => {
                let line = self.simple_statement(id, c)?;
                EmitHelper::write_line(w, c, &self.annotated(id, line))
            }
        }
    }

    /// A header line ending in `:` followed by the indented body.
    fn emit_compound<W: Write>(
        &self,
        id: NodeId,
        header: String,
        body: &[NodeId],
        w: &mut W,
        c: &mut EmitContext,
    ) -> EmitResult {
        EmitHelper::write_line(w, c, &self.annotated(id, format!("{}:", header)))?;
        c.indent();
        self.emit_block(body, w, c)?;
        c.dedent();
        Ok(())
    }

    fn emit_block<W: Write>(&self, body: &[NodeId], w: &mut W, c: &mut EmitContext) -> EmitResult {
        if body.is_empty() {
            return EmitHelper::write_line(w, c, &EmitHelper::paint(c, "pass", "blue"));
        }
        for stmt in body {
            self.emit_node(*stmt, w, c)?;
        }
        Ok(())
    }

    fn simple_statement(&self, id: NodeId, c: &EmitContext) -> Result<String> {
        let line = match self.ctx.kind(id)? {
            NodeKind::VariableDecl {
                target,
                value,
                is_public,
                is_constant,
                is_immutable,
            } => {
                let mut ty = self
                    .ctx
                    .ty(id)
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "?".to_string());
                if *is_constant {
                    ty = format!("constant({})", ty);
                }
                if *is_immutable {
                    ty = format!("immutable({})", ty);
                }
                if *is_public {
                    ty = format!("public({})", ty);
                }
                let mut line = format!("{}: {}", self.expr(*target)?, ty);
                if let Some(value) = value {
                    line.push_str(&format!(" = {}", self.expr(*value)?));
                }
                line
            }
            NodeKind::Assign { target, value } => {
                format!("{} = {}", self.expr(*target)?, self.expr(*value)?)
            }
            NodeKind::AugAssign { target, op, value } => format!(
                "{} {}= {}",
                self.expr(*target)?,
                op.symbol(),
                self.expr(*value)?
            ),
            NodeKind::AnnAssign { target, value } => {
                let mut line = self.expr(*target)?;
                if let Some(ty) = self.ctx.ty(*target) {
                    line.push_str(&format!(": {}", ty));
                }
                if let Some(value) = value {
                    line.push_str(&format!(" = {}", self.expr(*value)?));
                }
                line
            }
            NodeKind::Return { value } => {
                let keyword = EmitHelper::paint(c, "return", "blue");
                match value {
                    Some(value) => format!("{} {}", keyword, self.expr(*value)?),
                    None => keyword,
                }
            }
            NodeKind::Expr { value } => self.expr(*value)?,
            NodeKind::Assert { test } => {
                format!("{} {}", EmitHelper::paint(c, "assert", "blue"), self.expr(*test)?)
            }
            NodeKind::Pass => EmitHelper::paint(c, "pass", "blue"),
            NodeKind::StorageRead { target, slot, keys } => format!(
                "{} = {} {}{}",
                self.expr(*target)?,
                EmitHelper::paint(c, "storage_read", "magenta"),
                self.expr(*slot)?,
                self.key_list(keys)?
            ),
            NodeKind::StorageWrite { slot, keys, value } => format!(
                "{} {}{}({})",
                EmitHelper::paint(c, "storage_write", "magenta"),
                self.expr(*slot)?,
                self.key_list(keys)?,
                self.expr(*value)?
            ),
            other => return Err(anyhow!("node {} ({:?}) is not a statement", id, other.tag())),
        };
        Ok(line)
    }

    fn key_list(&self, keys: &[NodeId]) -> Result<String> {
        if keys.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("[{}]", self.expr_list(keys)?))
    }

    fn expr_list(&self, ids: &[NodeId]) -> Result<String> {
        Ok(ids
            .iter()
            .map(|id| self.expr(*id))
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    }

    fn arg(&self, id: NodeId) -> Result<String> {
        match self.ctx.kind(id)? {
            NodeKind::Arg { name } => Ok(match self.ctx.ty(id) {
                Some(ty) => format!("{}: {}", name, ty),
                None => name.clone(),
            }),
            other => Err(anyhow!("node {} ({:?}) is not an argument", id, other.tag())),
        }
    }

    /// An operand that is itself an operator expression is parenthesized.
    fn operand(&self, id: NodeId) -> Result<String> {
        let text = self.expr(id)?;
        Ok(match self.ctx.kind(id)? {
            NodeKind::BinOp { .. }
            | NodeKind::BoolOp { .. }
            | NodeKind::Compare { .. }
            | NodeKind::UnaryOp { .. } => format!("({})", text),
            _ => text,
        })
    }

    pub fn expr(&self, id: NodeId) -> Result<String> {
        let text = match self.ctx.kind(id)? {
            NodeKind::Name { id } => id.clone(),
            NodeKind::Attribute { value, attr } => format!("{}.{}", self.operand(*value)?, attr),
            NodeKind::Subscript { value, slice } => {
                format!("{}[{}]", self.operand(*value)?, self.expr(*slice)?)
            }
            NodeKind::BinOp { left, op, right } => format!(
                "{} {} {}",
                self.operand(*left)?,
                op.symbol(),
                self.operand(*right)?
            ),
            NodeKind::BoolOp { op, values } => {
                let joiner = match op {
                    BoolOpKind::And => " and ",
                    BoolOpKind::Or => " or ",
                };
                values
                    .iter()
                    .map(|v| self.operand(*v))
                    .collect::<Result<Vec<_>>>()?
                    .join(joiner)
            }
            NodeKind::Compare { left, op, right } => format!(
                "{} {} {}",
                self.operand(*left)?,
                op.symbol(),
                self.operand(*right)?
            ),
            NodeKind::UnaryOp { op, operand } => {
                let prefix = match op {
                    UnaryOpKind::Not => "not ",
                    UnaryOpKind::USub => "-",
                    UnaryOpKind::Invert => "~",
                };
                format!("{}{}", prefix, self.operand(*operand)?)
            }
            NodeKind::Call { func, args } => {
                format!("{}({})", self.expr(*func)?, self.expr_list(args)?)
            }
            NodeKind::Int { value } => value.to_string(),
            NodeKind::Bool { value } => (if *value { "True" } else { "False" }).to_string(),
            NodeKind::Str { value } => format!("{:?}", value),
            other => return Err(anyhow!("node {} ({:?}) is not an expression", id, other.tag())),
        };
        Ok(text)
    }

    fn annotated(&self, id: NodeId, line: String) -> String {
        let mut notes = Vec::new();
        if self.config.show_ids {
            notes.push(format!("#{}", id));
        }
        if self.config.show_types {
            if let Some(ty) = self.ctx.ty(id) {
                notes.push(ty.to_string());
            }
        }
        if notes.is_empty() {
            return line;
        }
        let comment = format!("# {}", notes.join(" "));
        let context = EmitContext::from_config(&self.config);
        format!("{}  {}", line, EmitHelper::paint(&context, &comment, "dimmed"))
    }
}

impl Emitter for SourceEmitter<'_> {
    type Item = NodeId;

    fn emit<W: Write>(&self, item: &NodeId, writer: &mut W, context: &mut EmitContext) -> EmitResult {
        self.emit_node(*item, writer, context)
    }

    fn initial_context(&self) -> EmitContext {
        EmitContext::from_config(&self.config)
    }
}
