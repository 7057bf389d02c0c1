//! Scalar function definitions, overload resolution and the built-in catalog
//!
//! A [`ScalarFunction`] is one overload: parameter and return type ids plus
//! an execution closure already monomorphised for the storage types of those
//! ids. Overloads of one name are grouped in a [`ScalarFunctionSet`].

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::common::error::{KuzuError, Result};
use crate::function::arithmetic::{
    Abs, Add, BinaryArithmeticOperation, Divide, Modulo, Multiply, Negate, Subtract,
    UnaryArithmeticOperation,
};
use crate::function::binary_executor::BinaryFunctionExecutor;
use crate::function::comparison::{
    ComparisonOperation, Equals, GreaterThan, GreaterThanEquals, LessThan, LessThanEquals,
    NotEquals,
};
use crate::function::nullary_executor::NullaryFunctionExecutor;
use crate::function::string_functions::{self, RegexBindData};
use crate::function::ternary_executor::{
    TernaryFunctionExecutor, TernaryOpArgs, TernaryRegexFunctionWrapper,
    TernaryStringFunctionWrapper,
};
use crate::function::unary_executor::{UnaryFunctionExecutor, UnaryNestedFunctionWrapper};
use crate::types::entries::ListEntry;
use crate::types::ku_uuid::KuUuid;
use crate::types::logical_type::{LogicalType, LogicalTypeID};
use crate::types::physical_value::{NumericValue, ScalarValue};
use crate::types::type_utils::{NumericTypeVisitor, TypeUtils, TypeVisitor};
use crate::vector::accessors::StringVector;
use crate::vector::selection_vector::SelectionVector;
use crate::vector::value_vector::ValueVector;

pub type ScalarExecFunc =
    Arc<dyn Fn(&[&ValueVector], &mut ValueVector) -> Result<()> + Send + Sync>;
pub type ScalarSelectFunc =
    Arc<dyn Fn(&[&ValueVector], &mut SelectionVector) -> Result<bool> + Send + Sync>;

#[derive(Clone)]
pub struct ScalarFunction {
    pub name: String,
    pub parameter_type_ids: Vec<LogicalTypeID>,
    pub return_type_id: LogicalTypeID,
    pub exec_func: ScalarExecFunc,
    pub select_func: Option<ScalarSelectFunc>,
}

impl ScalarFunction {
    pub fn new(
        name: impl Into<String>,
        parameter_type_ids: Vec<LogicalTypeID>,
        return_type_id: LogicalTypeID,
        exec_func: ScalarExecFunc,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_type_ids,
            return_type_id,
            exec_func,
            select_func: None,
        }
    }

    pub fn with_select(mut self, select_func: ScalarSelectFunc) -> Self {
        self.select_func = Some(select_func);
        self
    }

    pub fn execute(&self, params: &[&ValueVector], result: &mut ValueVector) -> Result<()> {
        crate::ku_assert!(params.len() == self.parameter_type_ids.len());
        (self.exec_func)(params, result)
    }

    /// Write the positions that pass the predicate into `sel_out`
    pub fn select(&self, params: &[&ValueVector], sel_out: &mut SelectionVector) -> Result<bool> {
        crate::ku_assert!(params.len() == self.parameter_type_ids.len());
        match &self.select_func {
            Some(select_func) => select_func(params, sel_out),
            None => Err(KuzuError::Runtime(format!(
                "Function {} cannot be evaluated as a filter.",
                self.name
            ))),
        }
    }

    /// `(INT64,INT64) -> INT64`
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.parameter_type_ids.iter().map(|id| id.name()).collect();
        format!("({}) -> {}", params.join(","), self.return_type_id)
    }

    /// Number of implicit casts needed to call this overload, if it can be called at all
    fn match_cost(&self, arg_types: &[LogicalType]) -> Option<u32> {
        if arg_types.len() != self.parameter_type_ids.len() {
            return None;
        }
        let mut cost = 0;
        for (arg, &param) in arg_types.iter().zip(&self.parameter_type_ids) {
            let arg_id = arg.type_id();
            if param == LogicalTypeID::Any || arg_id == param {
                continue;
            }
            if arg_id == LogicalTypeID::Any {
                cost += 1;
                continue;
            }
            if arg_id.is_nested() || param.is_nested() || param == LogicalTypeID::Decimal {
                return None;
            }
            let max = TypeUtils::try_get_max_logical_type(arg, &LogicalType::new(param))?;
            if max.type_id() != param {
                return None;
            }
            cost += 1;
        }
        Some(cost)
    }
}

impl fmt::Debug for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.signature())
    }
}

/// Overloads sharing one name
#[derive(Debug, Clone, Default)]
pub struct ScalarFunctionSet {
    name: String,
    functions: Vec<ScalarFunction>,
}

impl ScalarFunctionSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn functions(&self) -> &[ScalarFunction] {
        &self.functions
    }

    pub fn add(&mut self, function: ScalarFunction) -> Result<()> {
        if self
            .functions
            .iter()
            .any(|f| f.parameter_type_ids == function.parameter_type_ids)
        {
            return Err(KuzuError::Catalog(format!(
                "Function {} with signature {} already exists.",
                self.name,
                function.signature()
            )));
        }
        self.functions.push(function);
        Ok(())
    }

    /// Cheapest overload for `arg_types`; ties go to the first registered
    pub fn match_function(&self, arg_types: &[LogicalType]) -> Result<&ScalarFunction> {
        let mut best: Option<(&ScalarFunction, u32)> = None;
        for function in &self.functions {
            if let Some(cost) = function.match_cost(arg_types) {
                if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                    best = Some((function, cost));
                }
            }
        }
        best.map(|(function, _)| function).ok_or_else(|| {
            let actual: Vec<String> = arg_types.iter().map(|t| t.to_string()).collect();
            let expected: Vec<String> = self.functions.iter().map(|f| f.signature()).collect();
            KuzuError::Binder(format!(
                "Function {} did not receive correct arguments:\nActual:   ({})\nExpected: {}",
                self.name,
                actual.join(","),
                expected.join("\n          ")
            ))
        })
    }
}

struct BinaryArithmeticExec<Op>(PhantomData<Op>);

impl<Op: BinaryArithmeticOperation + 'static> NumericTypeVisitor for BinaryArithmeticExec<Op> {
    type Output = ScalarExecFunc;

    fn visit<T: NumericValue>(self) -> ScalarExecFunc {
        Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
            BinaryFunctionExecutor::execute(params[0], params[1], result, Op::operation::<T>)
        })
    }
}

struct UnaryArithmeticExec<Op>(PhantomData<Op>);

impl<Op: UnaryArithmeticOperation + 'static> NumericTypeVisitor for UnaryArithmeticExec<Op> {
    type Output = ScalarExecFunc;

    fn visit<T: NumericValue>(self) -> ScalarExecFunc {
        Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
            UnaryFunctionExecutor::execute(params[0], result, Op::operation::<T>)
        })
    }
}

/// Comparison closures for one storage type; nested types are not comparable
struct ComparisonExec<Op>(PhantomData<Op>);

impl<Op: ComparisonOperation + 'static> TypeVisitor for ComparisonExec<Op> {
    type Output = Option<(ScalarExecFunc, ScalarSelectFunc)>;

    fn visit_scalar<T: ScalarValue>(self, _: &LogicalType) -> Self::Output {
        let exec: ScalarExecFunc = Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
            BinaryFunctionExecutor::execute(params[0], params[1], result, |l: T, r: T| {
                Ok(Op::operation(&l, &r))
            })
        });
        let select: ScalarSelectFunc =
            Arc::new(|params: &[&ValueVector], sel_out: &mut SelectionVector| {
                BinaryFunctionExecutor::select(params[0], params[1], sel_out, |l: T, r: T| {
                    Ok(Op::operation(&l, &r))
                })
            });
        Some((exec, select))
    }

    fn visit_string(self, _: &LogicalType) -> Self::Output {
        let exec: ScalarExecFunc = Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
            BinaryFunctionExecutor::execute_string(
                params[0],
                params[1],
                result,
                |l: &[u8], r: &[u8], result: &mut ValueVector, pos: usize| {
                    result.set_value(pos, Op::operation(l, r));
                    Ok(())
                },
            )
        });
        let select: ScalarSelectFunc =
            Arc::new(|params: &[&ValueVector], sel_out: &mut SelectionVector| {
                BinaryFunctionExecutor::select_string(params[0], params[1], sel_out, |l, r| {
                    Ok(Op::operation(l, r))
                })
            });
        Some((exec, select))
    }

    fn visit_list(self, _: &LogicalType) -> Self::Output {
        None
    }

    fn visit_struct(self, _: &LogicalType) -> Self::Output {
        None
    }
}

const NUMERIC_TYPE_IDS: &[LogicalTypeID] = &[
    LogicalTypeID::Int8,
    LogicalTypeID::Int16,
    LogicalTypeID::Int32,
    LogicalTypeID::Int64,
    LogicalTypeID::Int128,
    LogicalTypeID::Uint8,
    LogicalTypeID::Uint16,
    LogicalTypeID::Uint32,
    LogicalTypeID::Uint64,
    LogicalTypeID::Uint128,
    LogicalTypeID::Float,
    LogicalTypeID::Double,
];

const COMPARABLE_TYPE_IDS: &[LogicalTypeID] = &[
    LogicalTypeID::Bool,
    LogicalTypeID::Int8,
    LogicalTypeID::Int16,
    LogicalTypeID::Int32,
    LogicalTypeID::Int64,
    LogicalTypeID::Int128,
    LogicalTypeID::Uint8,
    LogicalTypeID::Uint16,
    LogicalTypeID::Uint32,
    LogicalTypeID::Uint64,
    LogicalTypeID::Uint128,
    LogicalTypeID::Float,
    LogicalTypeID::Double,
    LogicalTypeID::Date,
    LogicalTypeID::Timestamp,
    LogicalTypeID::TimestampSec,
    LogicalTypeID::TimestampMs,
    LogicalTypeID::TimestampNs,
    LogicalTypeID::TimestampTz,
    LogicalTypeID::Interval,
    LogicalTypeID::InternalId,
    LogicalTypeID::Uuid,
    LogicalTypeID::String,
    LogicalTypeID::Blob,
];

/// Catalog of built-in scalar functions, keyed by upper-case name
pub struct BuiltInFunctions {
    sets: HashMap<String, ScalarFunctionSet>,
}

impl BuiltInFunctions {
    pub fn new() -> Result<Self> {
        let mut functions = Self {
            sets: HashMap::new(),
        };
        functions.register_arithmetic_functions()?;
        functions.register_comparison_functions()?;
        functions.register_string_functions()?;
        functions.register_misc_functions()?;
        debug!(num_function_sets = functions.sets.len(), "registered built-in scalar functions");
        Ok(functions)
    }

    /// Register an overload, creating its set on first use
    pub fn add_function(&mut self, function: ScalarFunction) -> Result<()> {
        let name = function.name.to_uppercase();
        self.sets
            .entry(name.clone())
            .or_insert_with(|| ScalarFunctionSet::new(name))
            .add(function)
    }

    pub fn get_function_set(&self, name: &str) -> Option<&ScalarFunctionSet> {
        self.sets.get(&name.to_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_function_set(name).is_some()
    }

    pub fn match_function(&self, name: &str, arg_types: &[LogicalType]) -> Result<&ScalarFunction> {
        self.get_function_set(name)
            .ok_or_else(|| KuzuError::Catalog(format!("Function {} does not exist.", name)))?
            .match_function(arg_types)
    }

    fn register_arithmetic_functions(&mut self) -> Result<()> {
        self.register_binary_arithmetic::<Add>()?;
        self.register_binary_arithmetic::<Subtract>()?;
        self.register_binary_arithmetic::<Multiply>()?;
        self.register_binary_arithmetic::<Divide>()?;
        self.register_binary_arithmetic::<Modulo>()?;
        self.register_unary_arithmetic::<Negate>()?;
        self.register_unary_arithmetic::<Abs>()
    }

    fn register_binary_arithmetic<Op: BinaryArithmeticOperation + 'static>(&mut self) -> Result<()> {
        for &type_id in NUMERIC_TYPE_IDS {
            let exec_func = TypeUtils::visit_numeric(
                &LogicalType::new(type_id),
                BinaryArithmeticExec::<Op>(PhantomData),
            )?;
            self.add_function(ScalarFunction::new(
                Op::NAME,
                vec![type_id, type_id],
                type_id,
                exec_func,
            ))?;
        }
        Ok(())
    }

    fn register_unary_arithmetic<Op: UnaryArithmeticOperation + 'static>(&mut self) -> Result<()> {
        for &type_id in NUMERIC_TYPE_IDS {
            let exec_func = TypeUtils::visit_numeric(
                &LogicalType::new(type_id),
                UnaryArithmeticExec::<Op>(PhantomData),
            )?;
            self.add_function(ScalarFunction::new(Op::NAME, vec![type_id], type_id, exec_func))?;
        }
        Ok(())
    }

    fn register_comparison_functions(&mut self) -> Result<()> {
        self.register_comparison::<Equals>()?;
        self.register_comparison::<NotEquals>()?;
        self.register_comparison::<GreaterThan>()?;
        self.register_comparison::<GreaterThanEquals>()?;
        self.register_comparison::<LessThan>()?;
        self.register_comparison::<LessThanEquals>()
    }

    fn register_comparison<Op: ComparisonOperation + 'static>(&mut self) -> Result<()> {
        for &type_id in COMPARABLE_TYPE_IDS {
            let Some((exec_func, select_func)) =
                TypeUtils::visit(&LogicalType::new(type_id), ComparisonExec::<Op>(PhantomData))
            else {
                continue;
            };
            self.add_function(
                ScalarFunction::new(
                    Op::NAME,
                    vec![type_id, type_id],
                    LogicalTypeID::Bool,
                    exec_func,
                )
                .with_select(select_func),
            )?;
        }
        Ok(())
    }

    fn register_string_functions(&mut self) -> Result<()> {
        use LogicalTypeID::{Bool, Int64, String};

        self.add_function(ScalarFunction::new(
            "CONCAT",
            vec![String, String],
            String,
            Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
                BinaryFunctionExecutor::execute_string(
                    params[0],
                    params[1],
                    result,
                    string_functions::concat,
                )
            }),
        ))?;
        self.add_function(ScalarFunction::new(
            "LOWER",
            vec![String],
            String,
            Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
                UnaryFunctionExecutor::execute_string(params[0], result, string_functions::lower)
            }),
        ))?;
        self.add_function(ScalarFunction::new(
            "UPPER",
            vec![String],
            String,
            Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
                UnaryFunctionExecutor::execute_string(params[0], result, string_functions::upper)
            }),
        ))?;
        self.add_function(ScalarFunction::new(
            "LENGTH",
            vec![String],
            Int64,
            Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
                UnaryFunctionExecutor::execute_string(
                    params[0],
                    result,
                    |input: &[u8], result: &mut ValueVector, pos: usize| {
                        result.set_value(pos, string_functions::length(input));
                        Ok(())
                    },
                )
            }),
        ))?;
        self.add_function(ScalarFunction::new(
            "SUBSTR",
            vec![String, Int64, Int64],
            String,
            Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
                TernaryFunctionExecutor::execute_switch(
                    params[0],
                    params[1],
                    params[2],
                    result,
                    &mut TernaryStringFunctionWrapper::<i64, i64, _>::new(string_functions::substr),
                )
            }),
        ))?;
        self.add_function(ScalarFunction::new(
            "LPAD",
            vec![String, Int64, String],
            String,
            Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
                TernaryFunctionExecutor::execute_switch(
                    params[0],
                    params[1],
                    params[2],
                    result,
                    &mut |args: &TernaryOpArgs<'_>, result: &mut ValueVector| {
                        string_functions::lpad(
                            StringVector::get_bytes(args.a, args.a_pos),
                            args.b.get_value::<i64>(args.b_pos),
                            StringVector::get_bytes(args.c, args.c_pos),
                            result,
                            args.result_pos,
                        )
                    },
                )
            }),
        ))?;
        self.add_function(
            ScalarFunction::new(
                "CONTAINS",
                vec![String, String],
                Bool,
                Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
                    BinaryFunctionExecutor::execute_string(
                        params[0],
                        params[1],
                        result,
                        |l: &[u8], r: &[u8], result: &mut ValueVector, pos: usize| {
                            result.set_value(pos, string_functions::contains(l, r));
                            Ok(())
                        },
                    )
                }),
            )
            .with_select(Arc::new(|params: &[&ValueVector], sel_out: &mut SelectionVector| {
                BinaryFunctionExecutor::select_string(params[0], params[1], sel_out, |l, r| {
                    Ok(string_functions::contains(l, r))
                })
            })),
        )?;
        self.register_regex_functions()
    }

    fn register_regex_functions(&mut self) -> Result<()> {
        use LogicalTypeID::{Bool, String};

        let bind_data = Arc::new(RegexBindData::new());
        let exec_bind_data = bind_data.clone();
        let select_bind_data = bind_data.clone();
        self.add_function(
            ScalarFunction::new(
                "REGEXP_MATCHES",
                vec![String, String],
                Bool,
                Arc::new(move |params: &[&ValueVector], result: &mut ValueVector| {
                    BinaryFunctionExecutor::execute_string(
                        params[0],
                        params[1],
                        result,
                        |l: &[u8], r: &[u8], result: &mut ValueVector, pos: usize| {
                            let matches = string_functions::regexp_matches(l, r, &exec_bind_data)?;
                            result.set_value(pos, matches);
                            Ok(())
                        },
                    )
                }),
            )
            .with_select(Arc::new(
                move |params: &[&ValueVector], sel_out: &mut SelectionVector| {
                    BinaryFunctionExecutor::select_string(params[0], params[1], sel_out, |l, r| {
                        string_functions::regexp_matches(l, r, &select_bind_data)
                    })
                },
            )),
        )?;
        self.add_function(ScalarFunction::new(
            "REGEXP_REPLACE",
            vec![String, String, String],
            String,
            Arc::new(move |params: &[&ValueVector], result: &mut ValueVector| {
                TernaryFunctionExecutor::execute_switch(
                    params[0],
                    params[1],
                    params[2],
                    result,
                    &mut TernaryRegexFunctionWrapper::new(
                        &bind_data,
                        string_functions::regexp_replace,
                    ),
                )
            }),
        ))
    }

    fn register_misc_functions(&mut self) -> Result<()> {
        for type_id in [LogicalTypeID::List, LogicalTypeID::Array, LogicalTypeID::Map] {
            self.add_function(ScalarFunction::new(
                "SIZE",
                vec![type_id],
                LogicalTypeID::Int64,
                Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
                    UnaryFunctionExecutor::execute_switch(
                        params[0],
                        result,
                        &mut UnaryNestedFunctionWrapper::new(
                            |input: &ValueVector,
                             input_pos: usize,
                             result: &mut ValueVector,
                             result_pos: usize| {
                                let entry = input.get_value::<ListEntry>(input_pos);
                                result.set_value(result_pos, i64::from(entry.size));
                                Ok(())
                            },
                        ),
                    )
                }),
            ))?;
        }
        self.add_function(ScalarFunction::new(
            "GEN_RANDOM_UUID",
            Vec::new(),
            LogicalTypeID::Uuid,
            Arc::new(|_: &[&ValueVector], result: &mut ValueVector| {
                NullaryFunctionExecutor::execute(result, || Ok(KuUuid::generate_random()))
            }),
        ))
    }
}
